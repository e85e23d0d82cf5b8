use clap::Args;
use serde_json::{json, Value};

use credit_desk_core::config::DeskConfig;
use credit_desk_core::CompanyId;

use super::open_desk;

/// Arguments for fetching a company's analysis
#[derive(Args)]
pub struct AnalysisArgs {
    /// Company id
    pub id: CompanyId,

    /// Regenerate even when an analysis is stored
    #[arg(long)]
    pub force: bool,
}

pub async fn run_analysis(
    args: AnalysisArgs,
    config: &DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let desk = open_desk(config)?;
    let text = if args.force {
        desk.regenerate_analysis(args.id).await?
    } else {
        desk.get_analysis(args.id).await?
    };

    Ok(json!({
        "id": args.id,
        "analise": text,
    }))
}
