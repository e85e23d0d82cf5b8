use credit_desk_core::rating::RatingBand;
use credit_desk_core::store::{CreditStore, SqliteStore, StatusUpdate, FIRST_COMPANY_ID};
use credit_desk_core::{ApprovedTerms, CompanyProfile, CompanyStatus, CreditSuggestion};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn profile(name: &str, rating: &str) -> CompanyProfile {
    CompanyProfile {
        name: name.into(),
        annual_revenue: dec!(1000000),
        total_debt: dec!(250000.50),
        payment_days: 45,
        sector: "Varejo".into(),
        rating: rating.into(),
        recent_news: String::new(),
    }
}

#[tokio::test]
async fn test_first_company_gets_legacy_id() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.upsert_company(&profile("Acme", "A")).await.unwrap();
    assert_eq!(id, FIRST_COMPANY_ID);
}

#[tokio::test]
async fn test_upsert_by_name_keeps_id_and_status() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.upsert_company(&profile("Acme", "A")).await.unwrap();
    store
        .update_status(
            id,
            &StatusUpdate {
                status: CompanyStatus::Rejected,
                terms: None,
            },
        )
        .await
        .unwrap();

    let mut changed = profile("Acme", "B-");
    changed.total_debt = dec!(1);
    let again = store.upsert_company(&changed).await.unwrap();

    assert_eq!(again, id);
    let company = store.company(id).await.unwrap().unwrap();
    assert_eq!(company.rating, "B-");
    assert_eq!(company.total_debt, dec!(1));
    assert_eq!(company.status, CompanyStatus::Rejected);
}

#[tokio::test]
async fn test_list_and_search_companies() {
    let store = SqliteStore::open_in_memory().unwrap();
    let acme = store.upsert_company(&profile("Acme Ltda", "A")).await.unwrap();
    let beta = store.upsert_company(&profile("Beta 50%", "C")).await.unwrap();
    store.upsert_company(&profile("Gamma", "D")).await.unwrap();

    let page = store.list_companies(beta, 6).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, beta);
    assert_eq!(page[0].band, RatingBand::Yellow);
    assert_eq!(page[1].band, RatingBand::Red);

    let by_name = store.search_companies("acme", 10).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].band, RatingBand::Green);

    let by_id = store.search_companies(&acme.to_string(), 10).await.unwrap();
    assert_eq!(by_id[0].id, acme);

    // Wildcards in the term are literal.
    let literal = store.search_companies("50%", 10).await.unwrap();
    assert_eq!(literal.len(), 1);
    assert!(store.search_companies("_", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_folds_accented_case() {
    let store = SqliteStore::open_in_memory().unwrap();
    let agua = store.upsert_company(&profile("ÁGUA PURA LTDA", "B")).await.unwrap();
    store.upsert_company(&profile("Construções Éden", "C")).await.unwrap();

    for term in ["água", "ÁGUA", "Água Pura"] {
        let hits = store.search_companies(term, 10).await.unwrap();
        assert_eq!(hits.len(), 1, "term {term:?}");
        assert_eq!(hits[0].id, agua);
    }

    let eden = store.search_companies("construções éden", 10).await.unwrap();
    assert_eq!(eden.len(), 1);
    assert_eq!(eden[0].name, "Construções Éden");
}

#[tokio::test]
async fn test_status_update_sets_and_clears_terms() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.upsert_company(&profile("Acme", "A")).await.unwrap();
    let terms = ApprovedTerms {
        amount: dec!(10000.00),
        monthly_rate: dec!(0.025),
        term_months: 12,
    };

    let approved = StatusUpdate {
        status: CompanyStatus::Approved,
        terms: Some(terms.clone()),
    };
    assert!(store.update_status(id, &approved).await.unwrap());
    assert_eq!(store.company(id).await.unwrap().unwrap().approved_terms(), Some(terms));

    let rejected = StatusUpdate {
        status: CompanyStatus::Rejected,
        terms: None,
    };
    store.update_status(id, &rejected).await.unwrap();
    let company = store.company(id).await.unwrap().unwrap();
    assert_eq!(company.status, CompanyStatus::Rejected);
    assert_eq!(company.approved_amount, None);
    assert_eq!(company.approved_rate, None);
    assert_eq!(company.approved_term, None);

    assert!(!store.update_status(id + 1, &rejected).await.unwrap());
}

#[tokio::test]
async fn test_latest_analysis_is_highest_id() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.upsert_company(&profile("Acme", "A")).await.unwrap();
    assert!(store.latest_analysis(id).await.unwrap().is_none());

    store.insert_analysis(id, "first").await.unwrap();
    let second = store.insert_analysis(id, "second").await.unwrap();

    let latest = store.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.text, "second");
    assert_eq!(store.analysis_count(id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_set_suggestion_on_missing_record_fails() {
    let store = SqliteStore::open_in_memory().unwrap();
    let suggestion = CreditSuggestion {
        amount: dec!(1),
        monthly_rate: dec!(0.01),
        term_months: 1,
        rationale: "r".into(),
    };
    let err = store.set_suggestion(77, &suggestion).await.unwrap_err();
    assert!(matches!(
        err,
        credit_desk_core::CreditDeskError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.sqlite");

    let id = {
        let store = SqliteStore::open(&path).unwrap();
        let id = store.upsert_company(&profile("Acme", "A")).await.unwrap();
        store.insert_analysis(id, "persisted").await.unwrap();
        id
    };

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.path(), Some(path.as_path()));
    let latest = reopened.latest_analysis(id).await.unwrap().unwrap();
    assert_eq!(latest.text, "persisted");
    assert_eq!(
        reopened.company(id).await.unwrap().unwrap().total_debt,
        dec!(250000.50)
    );
}
