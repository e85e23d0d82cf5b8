pub mod analysis;
pub mod decide;
pub mod import;
pub mod search;
pub mod serve;
pub mod simulate;
pub mod suggestion;

use credit_desk_core::config::DeskConfig;
use credit_desk_core::CreditDesk;

/// Open the configured store and generator for a one-shot command.
pub fn open_desk(config: &DeskConfig) -> Result<CreditDesk, Box<dyn std::error::Error>> {
    Ok(CreditDesk::open(config)?)
}
