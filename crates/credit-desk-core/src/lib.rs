pub mod amortization;
pub mod config;
pub mod decision;
pub mod error;
pub mod generator;
pub mod locale;
pub mod protocol;
pub mod rating;
pub mod store;
pub mod types;

pub use error::CreditDeskError;
pub use protocol::CreditDesk;
pub use types::*;

/// Standard result type for all credit desk operations
pub type CreditDeskResult<T> = Result<T, CreditDeskError>;
