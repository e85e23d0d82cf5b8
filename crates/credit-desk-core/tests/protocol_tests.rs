use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use credit_desk_core::generator::{AnalysisGenerator, SuggestionGenerator};
use credit_desk_core::protocol::suggestion::NO_PRIOR_ANALYSIS;
use credit_desk_core::store::{CreditStore, SqliteStore};
use credit_desk_core::{
    Company, CompanyId, CompanyProfile, CreditDesk, CreditDeskError, CreditDeskResult,
    CreditSuggestion,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

/// Generator double that counts calls and can be switched into failure.
#[derive(Default)]
struct ScriptedGenerator {
    analyses: AtomicUsize,
    suggestions: AtomicUsize,
    fail_status: Mutex<Option<u16>>,
    delay: Option<Duration>,
    seen_analysis: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    fn analysis_calls(&self) -> usize {
        self.analyses.load(Ordering::SeqCst)
    }

    fn suggestion_calls(&self) -> usize {
        self.suggestions.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> CreditDeskResult<()> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(CreditDeskError::Generation {
                message: "service unavailable".into(),
                status: Some(status),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnalysisGenerator for ScriptedGenerator {
    async fn analyse(&self, company: &Company) -> CreditDeskResult<String> {
        let n = self.analyses.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
        Ok(format!("Analysis #{n} for {}", company.name))
    }
}

#[async_trait]
impl SuggestionGenerator for ScriptedGenerator {
    async fn suggest(&self, analysis: &str, _company: &Company) -> CreditDeskResult<CreditSuggestion> {
        let n = self.suggestions.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        self.seen_analysis.lock().unwrap().push(analysis.to_string());
        self.check_failure()?;
        Ok(CreditSuggestion {
            amount: dec!(500000),
            monthly_rate: dec!(0.015),
            term_months: 12 * n,
            rationale: format!("Suggestion #{n}"),
        })
    }
}

fn acme() -> CompanyProfile {
    CompanyProfile {
        name: "Acme".into(),
        annual_revenue: dec!(1000000),
        total_debt: dec!(200000),
        payment_days: 30,
        sector: "Tech".into(),
        rating: "A".into(),
        recent_news: "Expanding".into(),
    }
}

async fn desk_with(generator: Arc<ScriptedGenerator>) -> (CreditDesk, Arc<SqliteStore>, CompanyId) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let id = store.upsert_company(&acme()).await.unwrap();
    let desk = CreditDesk::with_generator(store.clone(), generator);
    (desk, store, id)
}

// ===========================================================================
// GetAnalysis / RegenerateAnalysis
// ===========================================================================

#[tokio::test]
async fn test_get_analysis_generates_once_then_serves_cache() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    let first = desk.get_analysis(id).await.unwrap();
    let second = desk.get_analysis(id).await.unwrap();

    assert_eq!(first, "Analysis #1 for Acme");
    assert_eq!(second, first);
    assert_eq!(generator.analysis_calls(), 1);
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_analysis_returns_existing_record_without_generator() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;
    store.insert_analysis(id, "X").await.unwrap();

    assert_eq!(desk.get_analysis(id).await.unwrap(), "X");
    assert_eq!(generator.analysis_calls(), 0);
}

#[tokio::test]
async fn test_get_analysis_unknown_company_is_not_found() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, _) = desk_with(generator.clone()).await;

    let err = desk.get_analysis(999).await.unwrap_err();
    assert!(matches!(err, CreditDeskError::NotFound { .. }));
    assert_eq!(generator.analysis_calls(), 0);
    assert_eq!(store.analysis_count(999).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_analysis_generation_failure_persists_nothing() {
    let generator = Arc::new(ScriptedGenerator::default());
    generator.fail_with(503);
    let (desk, store, id) = desk_with(generator.clone()).await;

    let err = desk.get_analysis(id).await.unwrap_err();
    assert!(matches!(
        err,
        CreditDeskError::Generation { status: Some(503), .. }
    ));
    assert_eq!(store.analysis_count(id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_misses_call_generator_once() {
    let generator = Arc::new(ScriptedGenerator::slow(Duration::from_millis(50)));
    let (desk, store, id) = desk_with(generator.clone()).await;

    let a = desk.clone();
    let b = desk.clone();
    let (first, second) = tokio::join!(a.get_analysis(id), b.get_analysis(id));

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(generator.analysis_calls(), 1);
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_regenerate_analysis_overwrites_latest_record() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;
    store.insert_analysis(id, "X").await.unwrap();

    let text = desk.regenerate_analysis(id).await.unwrap();

    assert_eq!(text, "Analysis #1 for Acme");
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
    assert_eq!(store.latest_analysis(id).await.unwrap().unwrap().text, text);
    assert_eq!(desk.get_analysis(id).await.unwrap(), text);
}

#[tokio::test]
async fn test_regenerate_analysis_creates_first_record() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    desk.regenerate_analysis(id).await.unwrap();
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_regenerate_analysis_keeps_suggestion_fields() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    let suggestion = desk.get_suggestion(id).await.unwrap();
    desk.regenerate_analysis(id).await.unwrap();

    let latest = store.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.text, "Analysis #2 for Acme");
    assert_eq!(latest.suggestion, Some(suggestion));
}

// ===========================================================================
// GetSuggestion / RegenerateSuggestion
// ===========================================================================

#[tokio::test]
async fn test_get_suggestion_is_idempotent() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    let first = desk.get_suggestion(id).await.unwrap();
    let second = desk.get_suggestion(id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.monthly_rate, dec!(0.015));
    assert_eq!(generator.analysis_calls(), 1);
    assert_eq!(generator.suggestion_calls(), 1);
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_suggestion_reuses_analysis_without_suggestion() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;
    let record = store.insert_analysis(id, "Existing analysis").await.unwrap();

    desk.get_suggestion(id).await.unwrap();

    assert_eq!(generator.analysis_calls(), 0);
    assert_eq!(
        generator.seen_analysis.lock().unwrap().as_slice(),
        ["Existing analysis".to_string()]
    );
    let latest = store.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.id, record.id);
    assert!(latest.suggestion.is_some());
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_suggestion_miss_creates_the_cached_analysis() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    desk.get_suggestion(id).await.unwrap();
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
    assert_eq!(
        *generator.seen_analysis.lock().unwrap(),
        vec!["Analysis #1 for Acme".to_string()]
    );

    // The record created on the suggestion miss is the cached analysis.
    assert_eq!(desk.get_analysis(id).await.unwrap(), "Analysis #1 for Acme");
    assert_eq!(generator.analysis_calls(), 1);
}

#[tokio::test]
async fn test_get_suggestion_unknown_company_is_not_found() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, _, _) = desk_with(generator.clone()).await;

    let err = desk.get_suggestion(4242).await.unwrap_err();
    assert!(matches!(err, CreditDeskError::NotFound { .. }));
    assert_eq!(generator.suggestion_calls(), 0);
}

#[tokio::test]
async fn test_regenerate_suggestion_overwrites_fields() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    let first = desk.get_suggestion(id).await.unwrap();
    let second = desk.regenerate_suggestion(id).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(second.term_months, 24);
    let latest = store.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.suggestion, Some(second));
    assert_eq!(store.analysis_count(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_regenerate_suggestion_failure_leaves_store_untouched() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;
    let stored = desk.get_suggestion(id).await.unwrap();

    generator.fail_with(500);
    let err = desk.regenerate_suggestion(id).await.unwrap_err();

    assert!(matches!(
        err,
        CreditDeskError::Generation { status: Some(500), .. }
    ));
    let latest = store.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.suggestion, Some(stored));
}

#[tokio::test]
async fn test_regenerate_suggestion_without_analysis_is_not_persisted() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (desk, store, id) = desk_with(generator.clone()).await;

    let suggestion = desk.regenerate_suggestion(id).await.unwrap();

    assert_eq!(suggestion.rationale, "Suggestion #1");
    assert_eq!(
        generator.seen_analysis.lock().unwrap().as_slice(),
        [NO_PRIOR_ANALYSIS.to_string()]
    );
    assert_eq!(store.analysis_count(id).await.unwrap(), 0);
}
