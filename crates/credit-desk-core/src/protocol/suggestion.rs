use tracing::{info, instrument, warn};

use super::{read_through, CreditDesk};
use crate::types::{AnalysisId, AnalysisRecord, CompanyId, CreditSuggestion};
use crate::CreditDeskResult;

/// Analysis text sent to the generator when a forced suggestion is requested
/// for a company that has never been analysed.
pub const NO_PRIOR_ANALYSIS: &str = "no prior analysis found";

impl CreditDesk {
    /// Stored suggestion for the company, generating one on a cache miss.
    ///
    /// A miss reuses the latest analysis record (and its id) when one exists,
    /// so the suggestion lands on that record instead of a new one.
    #[instrument(skip(self))]
    pub async fn get_suggestion(&self, company_id: CompanyId) -> CreditDeskResult<CreditSuggestion> {
        let _guard = self.locks.acquire(company_id).await;

        let latest = self.store.latest_analysis(company_id).await?;
        let cached = latest.as_ref().and_then(|r| r.suggestion.clone());

        let outcome = read_through(
            cached,
            move || self.generate_suggestion(company_id, latest),
            move |analysis_id, suggestion| self.store_suggestion(analysis_id, suggestion),
        )
        .await?;

        if outcome.is_hit() {
            info!(company_id, "suggestion served from store");
        }
        Ok(outcome.into_inner())
    }

    /// Always call the suggestion generator and write the result onto the
    /// latest analysis record. No record is created.
    #[instrument(skip(self))]
    pub async fn regenerate_suggestion(
        &self,
        company_id: CompanyId,
    ) -> CreditDeskResult<CreditSuggestion> {
        let _guard = self.locks.acquire(company_id).await;

        let company = self.require_company(company_id).await?;
        let latest = self.store.latest_analysis(company_id).await?;
        let analysis = latest
            .as_ref()
            .map(|r| r.text.as_str())
            .unwrap_or(NO_PRIOR_ANALYSIS);

        let suggestion = self.suggestions.suggest(analysis, &company).await?;

        match latest {
            Some(record) => {
                self.store.set_suggestion(record.id, &suggestion).await?;
                info!(company_id, analysis_id = record.id, "suggestion regenerated");
            }
            None => {
                warn!(company_id, "no analysis record to attach the suggestion to");
            }
        }
        Ok(suggestion)
    }

    async fn generate_suggestion(
        &self,
        company_id: CompanyId,
        latest: Option<AnalysisRecord>,
    ) -> CreditDeskResult<(AnalysisId, CreditSuggestion)> {
        info!(company_id, "no stored suggestion, calling generator");
        let (company, record) = match latest {
            Some(record) => (self.require_company(company_id).await?, record),
            None => {
                let (company, text) = self.generate_analysis(company_id).await?;
                let record = self.store_new_analysis(company.id, text).await?;
                (company, record)
            }
        };

        let suggestion = self.suggestions.suggest(&record.text, &company).await?;
        Ok((record.id, suggestion))
    }

    async fn store_suggestion(
        &self,
        analysis_id: AnalysisId,
        suggestion: CreditSuggestion,
    ) -> CreditDeskResult<CreditSuggestion> {
        self.store.set_suggestion(analysis_id, &suggestion).await?;
        info!(analysis_id, "suggestion stored");
        Ok(suggestion)
    }
}
