use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;

use credit_desk_api::AppState;
use credit_desk_core::config::DeskConfig;

/// Arguments for running the HTTP API
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides configuration)
    #[arg(long)]
    pub listen: Option<String>,

    /// Directory with the dashboard's static files
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,
}

pub async fn run_serve(
    args: ServeArgs,
    mut config: DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(dir) = args.static_dir {
        config.static_dir = Some(dir);
    }
    if let Some(path) = args.database {
        config.database_path = path;
    }

    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config)?;
    credit_desk_api::serve(state, addr).await?;

    Ok(json!({
        "status": "stopped",
        "listen_addr": addr.to_string(),
    }))
}
