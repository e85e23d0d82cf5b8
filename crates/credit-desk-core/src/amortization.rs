use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreditDeskError;
use crate::types::*;
use crate::CreditDeskResult;

const CENTS: u32 = 2;

/// Longest term accepted, in periods (100 years of monthly payments).
pub const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSimulationInput {
    pub principal: Money,
    /// Periodic (monthly) rate as a decimal.
    pub rate: Rate,
    /// Number of periods.
    pub term: u32,
}

/// Fixed installment and what the borrower pays in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub installment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// A single period in the Price-table schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub period: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSimulationOutput {
    pub installment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<SchedulePeriod>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fixed installment for a fully amortising loan (annuity formula):
///
/// `A = P·r·(1+r)^n / ((1+r)^n − 1)`
///
/// The installment is rounded to cents and the total is that installment
/// times `n`.
pub fn installment(principal: Money, rate: Rate, term: u32) -> CreditDeskResult<Installment> {
    validate(principal, rate, term)?;

    let factor = Decimal::ONE
        .checked_add(rate)
        .and_then(|base| base.checked_powi(term as i64))
        .ok_or_else(|| CreditDeskError::invalid("term", "Compounding factor overflows"))?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CreditDeskError::invalid(
            "rate",
            "Rate too small to amortise over the given term",
        ));
    }

    // factor / denominator is close to 1, so dividing first keeps the
    // intermediate within range for large factors.
    let exact = factor
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(principal))
        .and_then(|v| v.checked_mul(rate))
        .ok_or_else(|| overflow("principal"))?;
    let installment = round_cents(exact);
    let total_paid = installment
        .checked_mul(Decimal::from(term))
        .ok_or_else(|| overflow("principal"))?;

    Ok(Installment {
        installment,
        total_paid,
        total_interest: total_paid - principal,
    })
}

/// Period-by-period Price-table schedule. The last payment absorbs rounding so
/// the loan closes at exactly zero.
pub fn amortization_schedule(
    principal: Money,
    rate: Rate,
    term: u32,
) -> CreditDeskResult<Vec<SchedulePeriod>> {
    let fixed = installment(principal, rate, term)?;

    let mut periods = Vec::with_capacity(term as usize);
    let mut balance = principal;

    for period in 1..=term {
        let opening = balance;
        let interest = round_cents(opening.checked_mul(rate).ok_or_else(|| overflow("rate"))?);
        let (payment, amortised) = if period == term {
            let last = opening
                .checked_add(interest)
                .ok_or_else(|| overflow("principal"))?;
            (last, opening)
        } else {
            (fixed.installment, fixed.installment - interest)
        };
        balance = opening - amortised;

        periods.push(SchedulePeriod {
            period,
            opening_balance: opening,
            payment,
            interest,
            principal: amortised,
            closing_balance: balance,
        });
    }

    Ok(periods)
}

/// Run a loan simulation and wrap it in the computation envelope.
pub fn simulate_loan(
    input: &LoanSimulationInput,
) -> CreditDeskResult<ComputationOutput<LoanSimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fixed = installment(input.principal, input.rate, input.term)?;
    let schedule = amortization_schedule(input.principal, input.rate, input.term)?;

    if let Some(last) = schedule.last() {
        if last.payment != fixed.installment {
            warnings.push(format!(
                "Final payment adjusted to {} to absorb rounding",
                last.payment
            ));
        }
    }

    let output = LoanSimulationOutput {
        installment: fixed.installment,
        total_paid: fixed.total_paid,
        total_interest: fixed.total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "rate_basis": "periodic, decimal",
        "rounding": "installment rounded to cents, half away from zero",
    });

    Ok(with_metadata(
        "Fixed-installment amortisation (Price table)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate(principal: Money, rate: Rate, term: u32) -> CreditDeskResult<()> {
    if principal <= Decimal::ZERO {
        return Err(CreditDeskError::invalid(
            "principal",
            "Principal must be positive",
        ));
    }
    if rate <= Decimal::ZERO {
        return Err(CreditDeskError::invalid("rate", "Rate must be positive"));
    }
    if term == 0 {
        return Err(CreditDeskError::invalid(
            "term",
            "Number of periods must be > 0",
        ));
    }
    if term > MAX_TERM_MONTHS {
        return Err(CreditDeskError::invalid(
            "term",
            format!("Number of periods must be at most {MAX_TERM_MONTHS}"),
        ));
    }
    Ok(())
}

fn overflow(field: &str) -> CreditDeskError {
    CreditDeskError::invalid(field, "Result is too large to compute")
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
