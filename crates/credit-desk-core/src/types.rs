use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditDeskError;
use crate::rating::RatingBand;

/// All monetary values (BRL). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals per period (0.025 = 2.5% a.m.). Never as percentages.
pub type Rate = Decimal;

pub type CompanyId = i64;

pub type AnalysisId = i64;

/// Credit status of a company. Serialised with the dashboard's labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Aprovado")]
    Approved,
    #[serde(rename = "Recusado")]
    Rejected,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Pending => "Pendente",
            CompanyStatus::Approved => "Aprovado",
            CompanyStatus::Rejected => "Recusado",
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyStatus {
    type Err = CreditDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pendente" => Ok(CompanyStatus::Pending),
            "Aprovado" => Ok(CompanyStatus::Approved),
            "Recusado" => Ok(CompanyStatus::Rejected),
            other => Err(CreditDeskError::invalid(
                "status",
                format!("unknown company status '{other}'"),
            )),
        }
    }
}

/// Terms granted by an approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedTerms {
    pub amount: Money,
    pub monthly_rate: Rate,
    pub term_months: u32,
}

/// A business being evaluated for credit.
///
/// Field names on the wire match what the analysis generator expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    #[serde(rename = "empresa")]
    pub name: String,
    #[serde(rename = "receita_anual", with = "rust_decimal::serde::float")]
    pub annual_revenue: Money,
    #[serde(rename = "divida_total", with = "rust_decimal::serde::float")]
    pub total_debt: Money,
    /// Days the company takes to pay its debts.
    #[serde(rename = "prazo_pagamento")]
    pub payment_days: i64,
    #[serde(rename = "setor")]
    pub sector: String,
    pub rating: String,
    #[serde(rename = "noticias_recentes")]
    pub recent_news: String,
    #[serde(default)]
    pub status: CompanyStatus,
    #[serde(
        rename = "valor_aprovado",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub approved_amount: Option<Money>,
    #[serde(
        rename = "taxa_aprovada",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub approved_rate: Option<Rate>,
    #[serde(rename = "prazo_aprovado", default)]
    pub approved_term: Option<u32>,
}

impl Company {
    pub fn approved_terms(&self) -> Option<ApprovedTerms> {
        match (self.approved_amount, self.approved_rate, self.approved_term) {
            (Some(amount), Some(monthly_rate), Some(term_months)) => Some(ApprovedTerms {
                amount,
                monthly_rate,
                term_months,
            }),
            _ => None,
        }
    }
}

/// Profile data loaded by the importer. Keyed by company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(rename = "empresa")]
    pub name: String,
    #[serde(rename = "receita_anual")]
    pub annual_revenue: Money,
    #[serde(rename = "divida_total")]
    pub total_debt: Money,
    #[serde(rename = "prazo_pagamento")]
    pub payment_days: i64,
    #[serde(rename = "setor", default)]
    pub sector: String,
    #[serde(default)]
    pub rating: String,
    #[serde(rename = "noticias_recentes", default)]
    pub recent_news: String,
}

/// Row shown on listing and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    #[serde(rename = "empresa")]
    pub name: String,
    pub rating: String,
    #[serde(rename = "cor")]
    pub band: RatingBand,
}

impl CompanySummary {
    pub fn new(id: CompanyId, name: String, rating: String) -> Self {
        let band = RatingBand::from_rating(&rating);
        Self {
            id,
            name,
            rating,
            band,
        }
    }
}

/// A proposed credit offer. All four fields exist together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSuggestion {
    pub amount: Money,
    pub monthly_rate: Rate,
    pub term_months: u32,
    pub rationale: String,
}

/// One generated analysis for a company, optionally carrying a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub company_id: CompanyId,
    pub text: String,
    pub suggestion: Option<CreditSuggestion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_uses_dashboard_labels() {
        let json = serde_json::to_string(&CompanyStatus::Rejected).unwrap();
        assert_eq!(json, "\"Recusado\"");
        assert_eq!(
            "Aprovado".parse::<CompanyStatus>().unwrap(),
            CompanyStatus::Approved
        );
        assert!("Approved".parse::<CompanyStatus>().is_err());
    }

    #[test]
    fn test_company_wire_keys() {
        let company = Company {
            id: 5001,
            name: "Padaria Central".into(),
            annual_revenue: dec!(1_200_000),
            total_debt: dec!(300_000),
            payment_days: 45,
            sector: "Alimentos".into(),
            rating: "B+".into(),
            recent_news: "Abriu nova filial".into(),
            status: CompanyStatus::Pending,
            approved_amount: None,
            approved_rate: None,
            approved_term: None,
        };
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["empresa"], "Padaria Central");
        assert_eq!(value["receita_anual"], 1_200_000.0);
        assert_eq!(value["prazo_pagamento"], 45);
        assert_eq!(value["status"], "Pendente");
        assert!(value["valor_aprovado"].is_null());
        assert!(company.approved_terms().is_none());
    }
}
