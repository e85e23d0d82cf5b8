//! HTTP client for the analysis service (`/analisar`, `/sugerir_credito`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AnalysisGenerator, SuggestionGenerator};
use crate::config::GeneratorConfig;
use crate::error::CreditDeskError;
use crate::types::{Company, CreditSuggestion};
use crate::CreditDeskResult;

/// Maximum error body echoed back in a `Generation` error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new(config: &GeneratorConfig) -> CreditDeskResult<Self> {
        Self::with_config(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_config(base_url: impl Into<String>, timeout: Duration) -> CreditDeskResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| CreditDeskError::generation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode the reply, failing on any non-success
    /// status before the body is parsed.
    async fn post<B, R>(&self, endpoint: &str, body: &B) -> CreditDeskResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "calling generator");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CreditDeskError::Generation {
                message: format!("{endpoint} returned {status}: {}", truncate(&text)),
                status: Some(status.as_u16()),
            });
        }

        response.json::<R>().await.map_err(|e| CreditDeskError::Generation {
            message: format!("{endpoint} returned an unreadable body: {e}"),
            status: Some(status.as_u16()),
        })
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Deserialize)]
struct AnalysisReply {
    analise: Option<String>,
}

#[derive(Serialize)]
struct SuggestionRequest<'a> {
    analise: &'a str,
    dados_empresa: &'a Company,
}

/// Suggestion as the service returns it; the rate is a monthly percentage.
#[derive(Deserialize)]
struct SuggestionReply {
    valor_sugerido: Decimal,
    taxa_juros: Decimal,
    prazo_pagamento: u32,
    justificativa: String,
}

impl From<SuggestionReply> for CreditSuggestion {
    fn from(r: SuggestionReply) -> Self {
        CreditSuggestion {
            amount: r.valor_sugerido,
            monthly_rate: r.taxa_juros / dec!(100),
            term_months: r.prazo_pagamento,
            rationale: r.justificativa,
        }
    }
}

#[async_trait]
impl AnalysisGenerator for HttpGenerator {
    async fn analyse(&self, company: &Company) -> CreditDeskResult<String> {
        let reply: AnalysisReply = self.post("analisar", company).await?;
        match reply.analise {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(CreditDeskError::generation(
                "analisar returned no analysis text",
            )),
        }
    }
}

#[async_trait]
impl SuggestionGenerator for HttpGenerator {
    async fn suggest(&self, analysis: &str, company: &Company) -> CreditDeskResult<CreditSuggestion> {
        let request = SuggestionRequest {
            analise: analysis,
            dados_empresa: company,
        };
        let reply: SuggestionReply = self.post("sugerir_credito", &request).await?;
        Ok(reply.into())
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
