//! pt-BR number formats used by the dashboard form fields.
//!
//! Operators edit values such as `R$ 10.000,00`, `2,5% a.m.` and `12`; these
//! helpers turn them into `Decimal`s and back.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::error::CreditDeskError;
use crate::types::{Money, Rate};
use crate::CreditDeskResult;

/// Parse a currency string. `.` is always a thousands separator and `,` the
/// decimal separator: `"R$ 10.000,00"` → `10000.00`.
pub fn parse_currency(field: &str, raw: &str) -> CreditDeskResult<Money> {
    let token = numeric_token(field, raw)?;
    if token.matches(',').count() > 1 {
        return Err(CreditDeskError::invalid(
            field,
            format!("'{raw}' has more than one decimal comma"),
        ));
    }
    let normalised = token.replace('.', "").replace(',', ".");
    parse_decimal(field, raw, &normalised)
}

/// Parse a percentage string into a decimal rate: `"2,5% a.m."` → `0.025`.
///
/// With a comma present, `.` is read as a thousands separator; otherwise `.`
/// is the decimal point (`"1.5%"` → `0.015`).
pub fn parse_percent(field: &str, raw: &str) -> CreditDeskResult<Rate> {
    let token = numeric_token(field, raw)?;
    let normalised = if token.contains(',') {
        token.replace('.', "").replace(',', ".")
    } else {
        token.to_string()
    };
    let percent = parse_decimal(field, raw, &normalised)?;
    Ok(percent / dec!(100))
}

/// Parse a term in months. Leading digits are taken, so `"12 meses"` → `12`.
pub fn parse_term(field: &str, raw: &str) -> CreditDeskResult<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(CreditDeskError::invalid(
            field,
            format!("'{raw}' is not a whole number"),
        ));
    }
    digits
        .parse::<u32>()
        .map_err(|e| CreditDeskError::invalid(field, format!("'{raw}': {e}")))
}

/// Format money the way the dashboard displays it: `R$ 10.000,00`.
pub fn format_brl(amount: Money) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Format a decimal monthly rate as the dashboard shows it: `0.025` → `2,5% a.m.`
pub fn format_monthly_rate(rate: Rate) -> String {
    let percent = (rate * dec!(100)).normalize();
    format!("{}% a.m.", percent.to_string().replace('.', ","))
}

/// Serde helper for form fields that may arrive as text or as JSON numbers.
///
/// Numbers are rendered with a decimal comma so they read the same way as
/// typed values: `10000.5` → `"10000,5"`.
pub fn form_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string().replace('.', ",")),
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// The first run of digits and separators, with trailing separators dropped
/// (`"2,5% a.m."` → `"2,5"`). A minus sign ahead of the digits is an error.
fn numeric_token<'a>(field: &str, raw: &'a str) -> CreditDeskResult<&'a str> {
    let start = match raw.find(|c: char| c.is_ascii_digit()) {
        Some(i) => i,
        None => return Ok(""),
    };
    if raw[..start].contains(['-', '\u{2212}']) {
        return Err(CreditDeskError::invalid(
            field,
            format!("'{raw}' must not be negative"),
        ));
    }
    let rest = &raw[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(rest.len());
    Ok(rest[..end].trim_end_matches(['.', ',']))
}

fn parse_decimal(field: &str, raw: &str, normalised: &str) -> CreditDeskResult<Decimal> {
    if normalised.is_empty() {
        return Err(CreditDeskError::invalid(
            field,
            format!("'{raw}' is not a number"),
        ));
    }
    Decimal::from_str(normalised)
        .map_err(|e| CreditDeskError::invalid(field, format!("'{raw}': {e}")))
}
