use std::path::PathBuf;

use credit_desk_core::config::{DeskConfig, ListingConfig};
use credit_desk_core::{CreditDesk, CreditDeskResult};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub desk: CreditDesk,
    pub listing: ListingConfig,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(desk: CreditDesk, listing: ListingConfig) -> Self {
        Self {
            desk,
            listing,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Open the SQLite store and the HTTP generator described by `config`.
    pub fn from_config(config: &DeskConfig) -> CreditDeskResult<Self> {
        Ok(Self {
            desk: CreditDesk::open(config)?,
            listing: config.listing.clone(),
            static_dir: config.static_dir.clone(),
        })
    }
}
