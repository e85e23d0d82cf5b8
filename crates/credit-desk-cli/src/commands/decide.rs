use clap::Args;
use serde_json::Value;

use credit_desk_core::config::DeskConfig;
use credit_desk_core::decision::DecisionRequest;
use credit_desk_core::CompanyId;

use super::open_desk;

/// Arguments for recording a credit decision
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DecideArgs {
    /// Company id
    pub id: CompanyId,

    /// Aprovado / Recusado (Approved / Rejected also accepted)
    pub decision: String,

    /// Approved amount, e.g. "R$ 10.000,00"
    #[arg(long, alias = "valor")]
    pub amount: Option<String>,

    /// Approved monthly rate, e.g. "2,5% a.m."
    #[arg(long, alias = "taxa")]
    pub rate: Option<String>,

    /// Approved term in months
    #[arg(long, alias = "prazo")]
    pub term: Option<String>,
}

pub async fn run_decide(
    args: DecideArgs,
    config: &DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = DecisionRequest {
        decision: args.decision,
        amount: args.amount,
        rate: args.rate,
        term: args.term,
    };

    let desk = open_desk(config)?;
    let receipt = desk.record_decision(args.id, &request).await?;
    Ok(serde_json::to_value(receipt)?)
}
