use tracing::{info, instrument};

use super::{read_through, CreditDesk};
use crate::types::{AnalysisRecord, Company, CompanyId};
use crate::CreditDeskResult;

impl CreditDesk {
    /// Stored analysis text for the company, generating and storing one on a
    /// cache miss.
    #[instrument(skip(self))]
    pub async fn get_analysis(&self, company_id: CompanyId) -> CreditDeskResult<String> {
        let _guard = self.locks.acquire(company_id).await;

        let cached = self
            .store
            .latest_analysis(company_id)
            .await?
            .map(|record| record.text);

        let outcome = read_through(
            cached,
            move || self.generate_analysis(company_id),
            move |company: Company, text| async move {
                self.store_new_analysis(company.id, text)
                    .await
                    .map(|record| record.text)
            },
        )
        .await?;

        if outcome.is_hit() {
            info!(company_id, "analysis served from store");
        }
        Ok(outcome.into_inner())
    }

    /// Always call the generator, then overwrite the latest record (or create
    /// the first one).
    #[instrument(skip(self))]
    pub async fn regenerate_analysis(&self, company_id: CompanyId) -> CreditDeskResult<String> {
        let _guard = self.locks.acquire(company_id).await;

        let (company, text) = self.generate_analysis(company_id).await?;
        let record = self.store.upsert_latest_analysis(company.id, &text).await?;

        info!(company_id, analysis_id = record.id, "analysis regenerated");
        Ok(record.text)
    }

    /// Look the company up and ask the generator for a fresh analysis.
    /// Nothing is stored.
    pub(super) async fn generate_analysis(
        &self,
        company_id: CompanyId,
    ) -> CreditDeskResult<(Company, String)> {
        info!(company_id, "calling analysis generator");
        let company = self.require_company(company_id).await?;
        let text = self.analyses.analyse(&company).await?;
        Ok((company, text))
    }

    pub(super) async fn store_new_analysis(
        &self,
        company_id: CompanyId,
        text: String,
    ) -> CreditDeskResult<AnalysisRecord> {
        let record = self.store.insert_analysis(company_id, &text).await?;
        info!(company_id, analysis_id = record.id, "new analysis stored");
        Ok(record)
    }
}
