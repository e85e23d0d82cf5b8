use clap::Args;
use serde_json::Value;

use credit_desk_core::config::DeskConfig;
use credit_desk_core::store::{CreditStore, SqliteStore};

/// Arguments for company search
#[derive(Args)]
pub struct SearchArgs {
    /// Name fragment (case-insensitive) or exact company id
    pub term: String,

    /// Maximum number of results
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

pub async fn run_search(
    args: SearchArgs,
    config: &DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.term.trim().is_empty() {
        return Err("search term is empty".into());
    }
    let store = SqliteStore::open(&config.database_path)?;
    let results = store.search_companies(&args.term, args.limit).await?;
    Ok(serde_json::to_value(results)?)
}
