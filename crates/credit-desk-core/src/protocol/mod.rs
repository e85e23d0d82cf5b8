//! Cache-then-generate protocols for analyses and suggestions.
//!
//! Every operation for one company runs under that company's lock, so two
//! concurrent cache misses produce a single generator call and a single
//! stored record.

pub mod analysis;
pub mod locks;
pub mod suggestion;

use std::future::Future;
use std::sync::Arc;

#[cfg(all(feature = "sqlite", feature = "http"))]
use crate::config::DeskConfig;
use crate::decision::{self, DecisionReceipt, DecisionRequest};
use crate::error::CreditDeskError;
use crate::generator::{AnalysisGenerator, SuggestionGenerator};
#[cfg(all(feature = "sqlite", feature = "http"))]
use crate::generator::HttpGenerator;
use crate::store::CreditStore;
#[cfg(all(feature = "sqlite", feature = "http"))]
use crate::store::SqliteStore;
use crate::types::{Company, CompanyId};
use crate::CreditDeskResult;

pub use locks::{CompanyGuard, CompanyLocks};

/// Where a protocol result came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    Hit(T),
    Generated(T),
}

impl<T> Cached<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Cached::Hit(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Cached::Hit(v) | Cached::Generated(v) => v,
        }
    }
}

/// Return `cached` when present; otherwise run `generate`, which yields the
/// key to persist under together with the value, and hand both to `persist`.
pub async fn read_through<K, T, G, GFut, P, PFut>(
    cached: Option<T>,
    generate: G,
    persist: P,
) -> CreditDeskResult<Cached<T>>
where
    G: FnOnce() -> GFut,
    GFut: Future<Output = CreditDeskResult<(K, T)>>,
    P: FnOnce(K, T) -> PFut,
    PFut: Future<Output = CreditDeskResult<T>>,
{
    if let Some(value) = cached {
        return Ok(Cached::Hit(value));
    }
    let (key, value) = generate().await?;
    let stored = persist(key, value).await?;
    Ok(Cached::Generated(stored))
}

/// The credit desk service: store handle, generators and per-company locks.
#[derive(Clone)]
pub struct CreditDesk {
    store: Arc<dyn CreditStore>,
    analyses: Arc<dyn AnalysisGenerator>,
    suggestions: Arc<dyn SuggestionGenerator>,
    locks: CompanyLocks,
}

impl CreditDesk {
    pub fn new(
        store: Arc<dyn CreditStore>,
        analyses: Arc<dyn AnalysisGenerator>,
        suggestions: Arc<dyn SuggestionGenerator>,
    ) -> Self {
        Self {
            store,
            analyses,
            suggestions,
            locks: CompanyLocks::default(),
        }
    }

    /// Use one generator for both analyses and suggestions.
    pub fn with_generator<G>(store: Arc<dyn CreditStore>, generator: Arc<G>) -> Self
    where
        G: AnalysisGenerator + SuggestionGenerator + 'static,
    {
        Self::new(store, generator.clone(), generator)
    }

    /// SQLite store plus HTTP generator, as described by `config`.
    #[cfg(all(feature = "sqlite", feature = "http"))]
    pub fn open(config: &DeskConfig) -> CreditDeskResult<Self> {
        let store = Arc::new(SqliteStore::open(&config.database_path)?);
        let generator = Arc::new(HttpGenerator::new(&config.generator)?);
        tracing::info!(
            database = %config.database_path.display(),
            generator = generator.base_url(),
            "credit desk opened"
        );
        Ok(Self::with_generator(store, generator))
    }

    pub fn store(&self) -> &Arc<dyn CreditStore> {
        &self.store
    }

    pub async fn record_decision(
        &self,
        company_id: CompanyId,
        request: &DecisionRequest,
    ) -> CreditDeskResult<DecisionReceipt> {
        decision::record_decision(self.store.as_ref(), company_id, request).await
    }

    async fn require_company(&self, id: CompanyId) -> CreditDeskResult<Company> {
        self.store
            .company(id)
            .await?
            .ok_or_else(|| CreditDeskError::company_not_found(id))
    }
}
