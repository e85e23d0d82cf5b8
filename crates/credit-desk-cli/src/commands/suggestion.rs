use clap::Args;
use serde_json::Value;

use credit_desk_api::handlers::SuggestionDto;
use credit_desk_core::config::DeskConfig;
use credit_desk_core::locale::{format_brl, format_monthly_rate};
use credit_desk_core::CompanyId;

use super::open_desk;

/// Arguments for fetching a company's credit suggestion
#[derive(Args)]
pub struct SuggestionArgs {
    /// Company id
    pub id: CompanyId,

    /// Ask the generator again and overwrite the stored suggestion
    #[arg(long)]
    pub force: bool,
}

pub async fn run_suggestion(
    args: SuggestionArgs,
    config: &DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let desk = open_desk(config)?;
    let suggestion = if args.force {
        desk.regenerate_suggestion(args.id).await?
    } else {
        desk.get_suggestion(args.id).await?
    };

    let amount_display = format_brl(suggestion.amount);
    let rate_display = format_monthly_rate(suggestion.monthly_rate);

    let mut value = serde_json::to_value(SuggestionDto::from(suggestion))?;
    if let Some(map) = value.as_object_mut() {
        map.insert("valor_display".into(), amount_display.into());
        map.insert("taxa_display".into(), rate_display.into());
    }
    Ok(value)
}
