use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::error::CreditDeskError;
use crate::locale::{form_field, parse_currency, parse_percent, parse_term};
use crate::store::{CreditStore, StatusUpdate};
use crate::types::*;
use crate::CreditDeskResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// The operator's final call on a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl FromStr for Decision {
    type Err = CreditDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase();
        match normalised.as_str() {
            "aprovado" | "approved" => Ok(Decision::Approved),
            "recusado" | "rejeitado" | "rejected" => Ok(Decision::Rejected),
            "" => Err(CreditDeskError::invalid("decisao", "No decision provided")),
            _ => Err(CreditDeskError::invalid(
                "decisao",
                format!("'{}' is not a valid decision", s.trim()),
            )),
        }
    }
}

/// Decision form as submitted by the dashboard. Values are the operator's
/// edited, locale-formatted strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(rename = "decisao", default)]
    pub decision: String,
    #[serde(rename = "valor", default, deserialize_with = "form_field")]
    pub amount: Option<String>,
    #[serde(rename = "taxa", default, deserialize_with = "form_field")]
    pub rate: Option<String>,
    #[serde(rename = "prazo", default, deserialize_with = "form_field")]
    pub term: Option<String>,
}

impl DecisionRequest {
    pub fn approve(
        amount: impl Into<String>,
        rate: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            decision: "Aprovado".into(),
            amount: Some(amount.into()),
            rate: Some(rate.into()),
            term: Some(term.into()),
        }
    }

    pub fn reject() -> Self {
        Self {
            decision: "Recusado".into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReceipt {
    pub company_id: CompanyId,
    pub status: CompanyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<ApprovedTerms>,
    #[serde(rename = "mensagem")]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the form and turn it into the status change to persist. Nothing
/// is written here, so a rejected form leaves the store untouched.
pub fn parse_decision(request: &DecisionRequest) -> CreditDeskResult<StatusUpdate> {
    match request.decision.parse::<Decision>()? {
        Decision::Approved => {
            let amount = parse_currency("valor", required(&request.amount, "valor")?)?;
            let monthly_rate = parse_percent("taxa", required(&request.rate, "taxa")?)?;
            let term_months = parse_term("prazo", required(&request.term, "prazo")?)?;

            if amount <= Money::ZERO {
                return Err(CreditDeskError::invalid("valor", "Amount must be positive"));
            }
            if monthly_rate <= Rate::ZERO {
                return Err(CreditDeskError::invalid("taxa", "Rate must be positive"));
            }
            if term_months == 0 {
                return Err(CreditDeskError::invalid("prazo", "Term must be at least one month"));
            }

            Ok(StatusUpdate {
                status: CompanyStatus::Approved,
                terms: Some(ApprovedTerms {
                    amount,
                    monthly_rate,
                    term_months,
                }),
            })
        }
        Decision::Rejected => Ok(StatusUpdate {
            status: CompanyStatus::Rejected,
            terms: None,
        }),
    }
}

/// Record the operator's decision against a company.
pub async fn record_decision(
    store: &dyn CreditStore,
    company_id: CompanyId,
    request: &DecisionRequest,
) -> CreditDeskResult<DecisionReceipt> {
    let update = parse_decision(request)?;

    if !store.update_status(company_id, &update).await? {
        return Err(CreditDeskError::company_not_found(company_id));
    }

    let message = match update.status {
        CompanyStatus::Approved => "Crédito aprovado com sucesso!",
        _ => "Crédito recusado com sucesso!",
    };
    info!(company_id, status = %update.status, "decision recorded");

    Ok(DecisionReceipt {
        company_id,
        status: update.status,
        terms: update.terms,
        message: message.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn required<'a>(value: &'a Option<String>, field: &str) -> CreditDeskResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CreditDeskError::invalid(field, "Required for an approval")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decision_labels() {
        assert_eq!("Aprovado".parse::<Decision>().unwrap(), Decision::Approved);
        assert_eq!("approved".parse::<Decision>().unwrap(), Decision::Approved);
        assert_eq!(" Recusado ".parse::<Decision>().unwrap(), Decision::Rejected);
        assert_eq!("Rejected".parse::<Decision>().unwrap(), Decision::Rejected);
        assert!("Unknown".parse::<Decision>().is_err());
        assert!("".parse::<Decision>().is_err());
    }

    #[test]
    fn test_parse_approval() {
        let request = DecisionRequest::approve("R$ 10.000,00", "2,5% a.m.", "12");
        let update = parse_decision(&request).unwrap();
        assert_eq!(update.status, CompanyStatus::Approved);
        assert_eq!(
            update.terms,
            Some(ApprovedTerms {
                amount: dec!(10000.00),
                monthly_rate: dec!(0.025),
                term_months: 12,
            })
        );
    }

    #[test]
    fn test_rejection_ignores_terms() {
        let request = DecisionRequest {
            decision: "Recusado".into(),
            amount: Some("garbage".into()),
            rate: None,
            term: None,
        };
        let update = parse_decision(&request).unwrap();
        assert_eq!(update.status, CompanyStatus::Rejected);
        assert!(update.terms.is_none());
    }

    #[test]
    fn test_approval_requires_every_field() {
        let mut request = DecisionRequest::approve("R$ 10.000,00", "2,5% a.m.", "12");
        request.term = None;
        match parse_decision(&request).unwrap_err() {
            CreditDeskError::InvalidInput { field, .. } => assert_eq!(field, "prazo"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_approval_rejects_zero_amount() {
        let request = DecisionRequest::approve("R$ 0,00", "2,5% a.m.", "12");
        assert!(matches!(
            parse_decision(&request),
            Err(CreditDeskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_numeric_term_in_json() {
        let request: DecisionRequest = serde_json::from_str(
            r#"{"decisao":"Aprovado","valor":"R$ 5.000,00","taxa":"1,5% a.m.","prazo":24}"#,
        )
        .unwrap();
        assert_eq!(request.term.as_deref(), Some("24"));
    }

    #[test]
    fn test_numeric_amount_keeps_its_decimals() {
        let request: DecisionRequest = serde_json::from_str(
            r#"{"decisao":"Aprovado","valor":10000.5,"taxa":2.5,"prazo":"12"}"#,
        )
        .unwrap();
        let terms = parse_decision(&request).unwrap().terms.unwrap();
        assert_eq!(terms.amount, dec!(10000.5));
        assert_eq!(terms.monthly_rate, dec!(0.025));
    }
}
