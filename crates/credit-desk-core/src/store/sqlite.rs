//! SQLite-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::{CreditStore, StatusUpdate};
use crate::error::CreditDeskError;
use crate::types::*;
use crate::CreditDeskResult;

const SCHEMA: &str = "\
PRAGMA foreign_keys=ON;
CREATE TABLE IF NOT EXISTS empresas (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  empresa TEXT NOT NULL UNIQUE,
  receita_anual TEXT NOT NULL DEFAULT '0',
  divida_total TEXT NOT NULL DEFAULT '0',
  prazo_pagamento INTEGER NOT NULL DEFAULT 0,
  setor TEXT NOT NULL DEFAULT '',
  rating TEXT NOT NULL DEFAULT '',
  noticias_recentes TEXT NOT NULL DEFAULT '',
  status TEXT NOT NULL DEFAULT 'Pendente',
  valor_aprovado TEXT,
  taxa_aprovada TEXT,
  prazo_aprovado INTEGER
);
CREATE TABLE IF NOT EXISTS analises (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  empresa_id INTEGER NOT NULL REFERENCES empresas(id),
  analise TEXT NOT NULL,
  valor_sugerido TEXT,
  taxa_juros TEXT,
  prazo_sugerido INTEGER,
  sugestao_justificativa TEXT,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  CHECK (
    (valor_sugerido IS NULL AND taxa_juros IS NULL
       AND prazo_sugerido IS NULL AND sugestao_justificativa IS NULL)
    OR
    (valor_sugerido IS NOT NULL AND taxa_juros IS NOT NULL
       AND prazo_sugerido IS NOT NULL AND sugestao_justificativa IS NOT NULL)
  )
);
CREATE INDEX IF NOT EXISTS idx_analises_empresa ON analises (empresa_id, id DESC);
INSERT INTO sqlite_sequence (name, seq)
  SELECT 'empresas', 5000
  WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = 'empresas');";

const COMPANY_COLUMNS: &str = "id, empresa, receita_anual, divida_total, prazo_pagamento, setor, \
     rating, noticias_recentes, status, valor_aprovado, taxa_aprovada, prazo_aprovado";

const ANALYSIS_COLUMNS: &str = "id, empresa_id, analise, valor_sugerido, taxa_juros, \
     prazo_sugerido, sugestao_justificativa, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> CreditDeskResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn, Some(path))
    }

    pub fn open_in_memory() -> CreditDeskResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> CreditDeskResult<Self> {
        register_fold_case(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<F, R>(&self, f: F) -> CreditDeskResult<R>
    where
        F: FnOnce(&Connection) -> CreditDeskResult<R>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| CreditDeskError::Persistence("connection lock poisoned".into()))?;
        f(&guard)
    }

    async fn run<F, R>(&self, f: F) -> CreditDeskResult<R>
    where
        F: FnOnce(&Connection) -> CreditDeskResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f)).await?
    }
}

#[async_trait]
impl CreditStore for SqliteStore {
    async fn company(&self, id: CompanyId) -> CreditDeskResult<Option<Company>> {
        self.run(move |conn| {
            let sql = format!("SELECT {COMPANY_COLUMNS} FROM empresas WHERE id = ?1");
            let company = conn
                .query_row(&sql, params![id], company_from_row)
                .optional()?;
            Ok(company)
        })
        .await
    }

    async fn list_companies(
        &self,
        from_id: CompanyId,
        limit: usize,
    ) -> CreditDeskResult<Vec<CompanySummary>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, empresa, rating FROM empresas WHERE id >= ?1 ORDER BY id ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![from_id, limit as i64], summary_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn search_companies(
        &self,
        term: &str,
        limit: usize,
    ) -> CreditDeskResult<Vec<CompanySummary>> {
        let term = term.trim().to_string();
        self.run(move |conn| {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            let mut stmt = conn.prepare(
                "SELECT id, empresa, rating FROM empresas \
                 WHERE fold_case(empresa) LIKE ?1 ESCAPE '\\' OR CAST(id AS TEXT) = ?2 \
                 ORDER BY id ASC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![pattern, term, limit as i64], summary_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn upsert_company(&self, profile: &CompanyProfile) -> CreditDeskResult<CompanyId> {
        let profile = profile.clone();
        self.run(move |conn| {
            let id = conn.query_row(
                "INSERT INTO empresas \
                   (empresa, receita_anual, divida_total, prazo_pagamento, setor, rating, noticias_recentes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT (empresa) DO UPDATE SET \
                   receita_anual = excluded.receita_anual, \
                   divida_total = excluded.divida_total, \
                   prazo_pagamento = excluded.prazo_pagamento, \
                   setor = excluded.setor, \
                   rating = excluded.rating, \
                   noticias_recentes = excluded.noticias_recentes \
                 RETURNING id",
                params![
                    profile.name,
                    profile.annual_revenue.to_string(),
                    profile.total_debt.to_string(),
                    profile.payment_days,
                    profile.sector,
                    profile.rating,
                    profile.recent_news,
                ],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(id)
        })
        .await
    }

    async fn update_status(&self, id: CompanyId, update: &StatusUpdate) -> CreditDeskResult<bool> {
        let update = update.clone();
        self.run(move |conn| {
            let (amount, rate, term) = match &update.terms {
                Some(t) => (
                    Some(t.amount.to_string()),
                    Some(t.monthly_rate.to_string()),
                    Some(t.term_months),
                ),
                None => (None, None, None),
            };
            let changed = conn.execute(
                "UPDATE empresas \
                 SET status = ?1, valor_aprovado = ?2, taxa_aprovada = ?3, prazo_aprovado = ?4 \
                 WHERE id = ?5",
                params![update.status.as_str(), amount, rate, term, id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn latest_analysis(
        &self,
        company_id: CompanyId,
    ) -> CreditDeskResult<Option<AnalysisRecord>> {
        self.run(move |conn| latest_analysis(conn, company_id)).await
    }

    async fn insert_analysis(
        &self,
        company_id: CompanyId,
        text: &str,
    ) -> CreditDeskResult<AnalysisRecord> {
        let text = text.to_string();
        self.run(move |conn| insert_analysis(conn, company_id, &text))
            .await
    }

    async fn upsert_latest_analysis(
        &self,
        company_id: CompanyId,
        text: &str,
    ) -> CreditDeskResult<AnalysisRecord> {
        let text = text.to_string();
        self.run(move |conn| {
            let tx = conn.unchecked_transaction()?;
            let now = Utc::now().to_rfc3339();
            let updated = tx.execute(
                "UPDATE analises SET analise = ?1, updated_at = ?2 \
                 WHERE id = (SELECT id FROM analises WHERE empresa_id = ?3 ORDER BY id DESC LIMIT 1)",
                params![text, now, company_id],
            )?;
            let record = if updated == 0 {
                insert_analysis(&tx, company_id, &text)?
            } else {
                latest_analysis(&tx, company_id)?.ok_or_else(|| {
                    CreditDeskError::Persistence("updated analysis disappeared".into())
                })?
            };
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn set_suggestion(
        &self,
        analysis_id: AnalysisId,
        suggestion: &CreditSuggestion,
    ) -> CreditDeskResult<()> {
        let suggestion = suggestion.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE analises SET valor_sugerido = ?1, taxa_juros = ?2, prazo_sugerido = ?3, \
                   sugestao_justificativa = ?4, updated_at = ?5 \
                 WHERE id = ?6",
                params![
                    suggestion.amount.to_string(),
                    suggestion.monthly_rate.to_string(),
                    suggestion.term_months,
                    suggestion.rationale,
                    Utc::now().to_rfc3339(),
                    analysis_id,
                ],
            )?;
            if changed == 0 {
                return Err(CreditDeskError::NotFound {
                    entity: "analysis".into(),
                    id: analysis_id.to_string(),
                });
            }
            Ok(())
        })
        .await
    }

    async fn analysis_count(&self, company_id: CompanyId) -> CreditDeskResult<usize> {
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM analises WHERE empresa_id = ?1",
                params![company_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn latest_analysis(conn: &Connection, company_id: CompanyId) -> CreditDeskResult<Option<AnalysisRecord>> {
    let sql = format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analises WHERE empresa_id = ?1 ORDER BY id DESC LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![company_id], analysis_from_row)
        .optional()?)
}

fn insert_analysis(conn: &Connection, company_id: CompanyId, text: &str) -> CreditDeskResult<AnalysisRecord> {
    let now = Utc::now();
    let stamp = now.to_rfc3339();
    conn.execute(
        "INSERT INTO analises (empresa_id, analise, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![company_id, text, stamp],
    )?;
    Ok(AnalysisRecord {
        id: conn.last_insert_rowid(),
        company_id,
        text: text.to_string(),
        suggestion: None,
        created_at: now,
        updated_at: now,
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    let status: String = row.get(8)?;
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        annual_revenue: decimal_column(row, 2)?,
        total_debt: decimal_column(row, 3)?,
        payment_days: row.get(4)?,
        sector: row.get(5)?,
        rating: row.get(6)?,
        recent_news: row.get(7)?,
        status: CompanyStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        approved_amount: optional_decimal_column(row, 9)?,
        approved_rate: optional_decimal_column(row, 10)?,
        approved_term: row.get(11)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<CompanySummary> {
    Ok(CompanySummary::new(row.get(0)?, row.get(1)?, row.get(2)?))
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let amount = optional_decimal_column(row, 3)?;
    let rate = optional_decimal_column(row, 4)?;
    let term: Option<u32> = row.get(5)?;
    let rationale: Option<String> = row.get(6)?;

    let suggestion = match (amount, rate, term, rationale) {
        (Some(amount), Some(monthly_rate), Some(term_months), Some(rationale)) => {
            Some(CreditSuggestion {
                amount,
                monthly_rate,
                term_months,
                rationale,
            })
        }
        _ => None,
    };

    Ok(AnalysisRecord {
        id: row.get(0)?,
        company_id: row.get(1)?,
        text: row.get(2)?,
        suggestion,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `fold_case(text)`: Unicode lower-casing. SQLite's own `LIKE` and `lower()`
/// only fold ASCII, which misses accented names such as `ÁGUA`.
fn register_fold_case(conn: &Connection) -> CreditDeskResult<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("Padaria"), "Padaria");
    }
}
