//! External generators that write analyses and credit suggestions.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;

use crate::types::{Company, CreditSuggestion};
use crate::CreditDeskResult;

#[cfg(feature = "http")]
pub use http::HttpGenerator;

/// Produces the narrative credit analysis for a company.
#[async_trait]
pub trait AnalysisGenerator: Send + Sync {
    async fn analyse(&self, company: &Company) -> CreditDeskResult<String>;
}

/// Produces a credit offer from an analysis and the company record.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn suggest(&self, analysis: &str, company: &Company)
        -> CreditDeskResult<CreditSuggestion>;
}
