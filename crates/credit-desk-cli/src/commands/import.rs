use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

use credit_desk_core::config::DeskConfig;
use credit_desk_core::locale::{form_field, parse_currency, parse_term};
use credit_desk_core::store::{CreditStore, SqliteStore};
use credit_desk_core::{CompanyProfile, Money};

use crate::input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    Csv,
    Json,
}

/// Arguments for importing company profiles
#[derive(Args)]
pub struct ImportArgs {
    /// CSV or JSON file (reads piped stdin when omitted)
    pub path: Option<String>,

    /// Input format; inferred from the file extension when omitted
    #[arg(long)]
    pub format: Option<ImportFormat>,
}

/// One company row. Accepts both the legacy spreadsheet headers and the
/// API field names.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(rename = "empresa", alias = "Empresa")]
    name: String,
    #[serde(
        rename = "receita_anual",
        alias = "Receita Anual",
        default,
        deserialize_with = "form_field"
    )]
    annual_revenue: Option<String>,
    #[serde(
        rename = "divida_total",
        alias = "Dívida Total",
        default,
        deserialize_with = "form_field"
    )]
    total_debt: Option<String>,
    #[serde(
        rename = "prazo_pagamento",
        alias = "Prazo de Pagamento (dias)",
        default,
        deserialize_with = "form_field"
    )]
    payment_days: Option<String>,
    #[serde(rename = "setor", alias = "Setor", default)]
    sector: Option<String>,
    #[serde(alias = "Rating", default)]
    rating: Option<String>,
    #[serde(rename = "noticias_recentes", alias = "Notícias Recentes", default)]
    recent_news: Option<String>,
}

impl ImportRow {
    fn into_profile(self) -> Result<CompanyProfile, Box<dyn std::error::Error>> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("company name is empty".into());
        }
        Ok(CompanyProfile {
            annual_revenue: amount("receita_anual", self.annual_revenue.as_deref())?,
            total_debt: amount("divida_total", self.total_debt.as_deref())?,
            payment_days: match blank_to_none(self.payment_days.as_deref()) {
                Some(raw) => i64::from(parse_term("prazo_pagamento", raw)?),
                None => 0,
            },
            sector: self.sector.unwrap_or_default().trim().to_string(),
            rating: self.rating.unwrap_or_default().trim().to_string(),
            recent_news: self.recent_news.unwrap_or_default().trim().to_string(),
            name,
        })
    }
}

fn blank_to_none(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Blank cells are zero. Plain decimals (`1500000.50`) are taken as-is,
/// anything else goes through the pt-BR currency parser.
fn amount(field: &str, raw: Option<&str>) -> Result<Money, Box<dyn std::error::Error>> {
    match blank_to_none(raw) {
        None => Ok(Decimal::ZERO),
        Some(text) => match Decimal::from_str(text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(parse_currency(field, text)?),
        },
    }
}

fn detect_format(path: Option<&str>, contents: &str) -> ImportFormat {
    if let Some(p) = path {
        let lower = p.to_lowercase();
        if lower.ends_with(".json") {
            return ImportFormat::Json;
        }
        if lower.ends_with(".csv") {
            return ImportFormat::Csv;
        }
    }
    match contents.trim_start().chars().next() {
        Some('[') | Some('{') => ImportFormat::Json,
        _ => ImportFormat::Csv,
    }
}

fn parse_rows(
    format: ImportFormat,
    contents: &str,
) -> Result<Vec<ImportRow>, Box<dyn std::error::Error>> {
    match format {
        ImportFormat::Json => {
            let value: Value = serde_json::from_str(contents)?;
            let rows = match value {
                Value::Array(_) => serde_json::from_value(value)?,
                other => vec![serde_json::from_value(other)?],
            };
            Ok(rows)
        }
        ImportFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(contents.as_bytes());
            let mut rows = Vec::new();
            for (idx, record) in reader.deserialize::<ImportRow>().enumerate() {
                // Header is line 1.
                let row = record.map_err(|e| format!("line {}: {}", idx + 2, e))?;
                rows.push(row);
            }
            Ok(rows)
        }
    }
}

pub async fn run_import(
    args: ImportArgs,
    config: &DeskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = if let Some(ref path) = args.path {
        input::file::read_text(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("provide a file path or pipe CSV/JSON on stdin".into());
    };

    let format = args
        .format
        .unwrap_or_else(|| detect_format(args.path.as_deref(), &contents));
    let profiles = parse_rows(format, &contents)?
        .into_iter()
        .map(ImportRow::into_profile)
        .collect::<Result<Vec<_>, _>>()?;

    let store = SqliteStore::open(&config.database_path)?;
    let mut imported = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        let id = store.upsert_company(profile).await?;
        imported.push(json!({ "id": id, "empresa": profile.name }));
    }
    tracing::info!(count = imported.len(), "companies imported");

    Ok(json!({
        "imported": imported.len(),
        "companies": imported,
    }))
}
