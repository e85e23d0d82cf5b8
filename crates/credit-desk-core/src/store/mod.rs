//! Persistent store for companies and their analysis history.

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

use crate::types::*;
use crate::CreditDeskResult;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Id given to the first company inserted into a fresh database, matching
/// the legacy data set.
pub const FIRST_COMPANY_ID: CompanyId = 5001;

/// Status change written by the decision recorder.
///
/// `terms` must be `Some` exactly when `status` is `Approved`; any other
/// status clears the approved fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: CompanyStatus,
    pub terms: Option<ApprovedTerms>,
}

#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn company(&self, id: CompanyId) -> CreditDeskResult<Option<Company>>;

    /// Companies with `id >= from_id`, ascending, at most `limit`.
    async fn list_companies(
        &self,
        from_id: CompanyId,
        limit: usize,
    ) -> CreditDeskResult<Vec<CompanySummary>>;

    /// Case-insensitive name match or exact id match.
    async fn search_companies(
        &self,
        term: &str,
        limit: usize,
    ) -> CreditDeskResult<Vec<CompanySummary>>;

    /// Insert or update a company by name. Status and approved fields are
    /// left untouched on update.
    async fn upsert_company(&self, profile: &CompanyProfile) -> CreditDeskResult<CompanyId>;

    /// Returns `false` when no company has this id.
    async fn update_status(&self, id: CompanyId, update: &StatusUpdate) -> CreditDeskResult<bool>;

    /// Most recent analysis record (highest id) for the company.
    async fn latest_analysis(&self, company_id: CompanyId)
        -> CreditDeskResult<Option<AnalysisRecord>>;

    async fn insert_analysis(
        &self,
        company_id: CompanyId,
        text: &str,
    ) -> CreditDeskResult<AnalysisRecord>;

    /// Overwrite the text of the most recent record, or insert one when the
    /// company has no analysis yet.
    async fn upsert_latest_analysis(
        &self,
        company_id: CompanyId,
        text: &str,
    ) -> CreditDeskResult<AnalysisRecord>;

    /// Write all four suggestion fields onto one record.
    async fn set_suggestion(
        &self,
        analysis_id: AnalysisId,
        suggestion: &CreditSuggestion,
    ) -> CreditDeskResult<()>;

    async fn analysis_count(&self, company_id: CompanyId) -> CreditDeskResult<usize>;
}
