use crate::{ApiResult, AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use credit_desk_core::amortization::{simulate_loan, LoanSimulationInput, LoanSimulationOutput};
use credit_desk_core::decision::{DecisionReceipt, DecisionRequest};
use credit_desk_core::locale::{form_field, parse_currency, parse_percent, parse_term};
use credit_desk_core::{
    Company, CompanyId, CompanySummary, ComputationOutput, CreditDeskError, CreditSuggestion,
    Money, Rate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Search results are capped at this many rows.
const SEARCH_LIMIT: usize = 10;

/// Upper bound on a listing page, whatever the caller asks for.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub from: Option<CompanyId>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analise: String,
}

/// Suggestion as the dashboard reads it: the rate is a monthly percentage.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub valor_sugerido: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub taxa_juros: Decimal,
    pub prazo_pagamento: u32,
    pub justificativa: String,
}

impl From<CreditSuggestion> for SuggestionDto {
    fn from(s: CreditSuggestion) -> Self {
        Self {
            valor_sugerido: s.amount,
            taxa_juros: (s.monthly_rate * Decimal::ONE_HUNDRED).normalize(),
            prazo_pagamento: s.term_months,
            justificativa: s.rationale,
        }
    }
}

/// Simulator form: the same locale strings the decision form carries.
#[derive(Deserialize)]
pub struct SimulationRequest {
    #[serde(default, deserialize_with = "form_field")]
    pub valor: Option<String>,
    #[serde(default, deserialize_with = "form_field")]
    pub taxa: Option<String>,
    #[serde(default, deserialize_with = "form_field")]
    pub prazo: Option<String>,
}

impl SimulationRequest {
    fn into_input(self) -> Result<LoanSimulationInput, CreditDeskError> {
        let principal: Money = parse_currency("valor", &required(self.valor, "valor")?)?;
        let rate: Rate = parse_percent("taxa", &required(self.taxa, "taxa")?)?;
        let term = parse_term("prazo", &required(self.prazo, "prazo")?)?;
        Ok(LoanSimulationInput {
            principal,
            rate,
            term,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, CreditDeskError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CreditDeskError::invalid(field, "Required"))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn list_companies(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CompanySummary>>> {
    let Query(query) = query?;
    let from = query.from.unwrap_or(state.listing.first_company_id);
    let limit = query
        .limit
        .unwrap_or(state.listing.page_size)
        .min(MAX_PAGE_SIZE);

    let companies = state.desk.store().list_companies(from, limit).await?;
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
) -> ApiResult<Json<Company>> {
    let Path(id) = id?;
    let company = state
        .desk
        .store()
        .company(id)
        .await?
        .ok_or_else(|| CreditDeskError::company_not_found(id))?;
    Ok(Json(company))
}

pub async fn search_companies(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CompanySummary>>> {
    let Query(query) = query?;
    let term = query.q.trim();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let results = state.desk.store().search_companies(term, SEARCH_LIMIT).await?;
    Ok(Json(results))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Path(id) = id?;
    let analise = state.desk.get_analysis(id).await?;
    Ok(Json(AnalysisResponse { analise }))
}

pub async fn regenerate_analysis(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Path(id) = id?;
    let analise = state.desk.regenerate_analysis(id).await?;
    Ok(Json(AnalysisResponse { analise }))
}

pub async fn get_suggestion(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
) -> ApiResult<Json<SuggestionDto>> {
    let Path(id) = id?;
    let suggestion = state.desk.get_suggestion(id).await?;
    Ok(Json(suggestion.into()))
}

pub async fn regenerate_suggestion(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
) -> ApiResult<Json<SuggestionDto>> {
    let Path(id) = id?;
    let suggestion = state.desk.regenerate_suggestion(id).await?;
    Ok(Json(suggestion.into()))
}

pub async fn record_decision(
    State(state): State<AppState>,
    id: Result<Path<CompanyId>, PathRejection>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> ApiResult<Json<DecisionReceipt>> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let receipt = state.desk.record_decision(id, &request).await?;
    Ok(Json(receipt))
}

pub async fn simulate(
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> ApiResult<Json<ComputationOutput<LoanSimulationOutput>>> {
    let Json(request) = payload?;
    let input = request.into_input()?;
    Ok(Json(simulate_loan(&input)?))
}
