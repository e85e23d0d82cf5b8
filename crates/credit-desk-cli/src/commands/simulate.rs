use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use credit_desk_core::amortization::{simulate_loan, LoanSimulationInput};
use credit_desk_core::locale::{
    form_field, format_brl, format_monthly_rate, parse_currency, parse_percent, parse_term,
};

use crate::input;

/// Arguments for a loan simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SimulateArgs {
    /// Path to JSON input file with `valor`, `taxa` and `prazo` (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal, e.g. "R$ 10.000,00" or 10000
    #[arg(long, alias = "valor")]
    pub amount: Option<String>,

    /// Monthly rate, e.g. "2,5% a.m." or 2.5
    #[arg(long, alias = "taxa")]
    pub rate: Option<String>,

    /// Term in months
    #[arg(long, alias = "prazo")]
    pub term: Option<String>,

    /// Include the month-by-month schedule
    #[arg(long)]
    pub schedule: bool,
}

/// Same fields as the dashboard's simulator form.
#[derive(Deserialize)]
struct SimulationForm {
    #[serde(default, deserialize_with = "form_field")]
    valor: Option<String>,
    #[serde(default, deserialize_with = "form_field")]
    taxa: Option<String>,
    #[serde(default, deserialize_with = "form_field")]
    prazo: Option<String>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form: SimulationForm = if let Some(ref path) = args.input {
        serde_json::from_str(&input::file::read_text(path)?)?
    } else {
        SimulationForm {
            valor: args.amount,
            taxa: args.rate,
            prazo: args.term,
        }
    };

    let sim_input = LoanSimulationInput {
        principal: parse_currency(
            "valor",
            &form.valor.ok_or("--amount is required (or provide --input)")?,
        )?,
        rate: parse_percent(
            "taxa",
            &form.taxa.ok_or("--rate is required (or provide --input)")?,
        )?,
        term: parse_term(
            "prazo",
            &form.prazo.ok_or("--term is required (or provide --input)")?,
        )?,
    };

    let result = simulate_loan(&sim_input)?;
    let installment = result.result.installment;
    let rate = sim_input.rate;

    let mut value = serde_json::to_value(result)?;
    if let Some(res) = value.get_mut("result").and_then(Value::as_object_mut) {
        if !args.schedule {
            res.remove("schedule");
        }
        res.insert("installment_display".into(), format_brl(installment).into());
        res.insert("rate_display".into(), format_monthly_rate(rate).into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(amount: &str, rate: &str, term: &str) -> SimulateArgs {
        SimulateArgs {
            input: None,
            amount: Some(amount.into()),
            rate: Some(rate.into()),
            term: Some(term.into()),
            schedule: false,
        }
    }

    #[test]
    fn test_simulate_from_flags() {
        let value = run_simulate(args("R$ 10.000,00", "2% a.m.", "12")).unwrap();
        let result = &value["result"];
        assert_eq!(result["installment"], "945.60");
        assert_eq!(result["installment_display"], "R$ 945,60");
        assert_eq!(result["rate_display"], "2% a.m.");
        assert!(result.get("schedule").is_none());
    }

    #[test]
    fn test_simulate_rejects_zero_principal() {
        assert!(run_simulate(args("0", "2% a.m.", "12")).is_err());
    }
}
