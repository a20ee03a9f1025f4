use crate::common::{mount_pages, page_body, test_config};
use offer_harvest::storage::OfferStore;
use offer_harvest::{run_pipeline, FetchError, HarvestError};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_harvest_persists_every_offer() {
    let server = MockServer::start().await;
    mount_pages(&server, 3, 4).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data/job_board.db");
    let config = test_config(&server, &db_path);

    let report = run_pipeline(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.offers, 12);
    assert_eq!(report.rows_written, 12);

    let store = OfferStore::open(&db_path, "offers").unwrap();
    let rows = store.load_all().unwrap();
    assert_eq!(rows.len(), 12);

    // One fetch date per run
    assert!(rows.iter().all(|r| r.date_fetched == report.fetch_date));

    let first = &rows[0].offer;
    assert!(first.slug.as_deref().unwrap().starts_with("offer-"));
    assert_eq!(first.nice_to_have_skills, "null");
    assert_eq!(first.latitude.as_deref(), Some("50.0614"));
    assert_eq!(first.open_to_hire_ukrainians, None);

    let skills: Value = serde_json::from_str(&first.required_skills).unwrap();
    assert_eq!(skills, json!(["python", "sql"]));
}

#[tokio::test]
async fn test_explicit_page_count_skips_probe() {
    let server = MockServer::start().await;

    for page in 1..=2u32 {
        Mock::given(method("GET"))
            .and(path("/offers"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(page, 1, json!({"totalPages": 50}))),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &dir.path().join("offers.db"));
    config.fetcher.pages = Some(2);

    let report = run_pipeline(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.rows_written, 2);
}

#[tokio::test]
async fn test_one_failing_page_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .and(query_param("page", "7"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_pages(&server, 10, 3).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("offers.db");
    let mut config = test_config(&server, &db_path);
    config.fetcher.retries = 1;
    config.fetcher.pages = Some(10);

    let err = run_pipeline(&config, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "fetch");
    assert!(matches!(
        err,
        HarvestError::Fetch(FetchError::RetriesExhausted {
            last_status: Some(503),
            ..
        })
    ));

    let store = OfferStore::open(&db_path, "offers").unwrap();
    assert_eq!(store.count_rows().unwrap(), 0);
}

#[tokio::test]
async fn test_rerun_appends_duplicate_rows() {
    let server = MockServer::start().await;
    mount_pages(&server, 2, 2).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("offers.db");
    let config = test_config(&server, &db_path);

    run_pipeline(&config, CancellationToken::new()).await.unwrap();
    run_pipeline(&config, CancellationToken::new()).await.unwrap();

    let store = OfferStore::open(&db_path, "offers").unwrap();
    let rows = store.load_all().unwrap();
    assert_eq!(rows.len(), 8);

    let mut first_run: Vec<_> = rows[..4].iter().map(|r| r.offer.slug.clone()).collect();
    let mut second_run: Vec<_> = rows[4..].iter().map(|r| r.offer.slug.clone()).collect();
    first_run.sort();
    second_run.sort();
    assert_eq!(first_run, second_run);
}

#[tokio::test]
async fn test_cancelled_run_persists_nothing() {
    let server = MockServer::start().await;
    mount_pages(&server, 2, 2).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("offers.db");
    let config = test_config(&server, &db_path);

    let token = CancellationToken::new();
    token.cancel();

    let err = run_pipeline(&config, token).await.unwrap_err();
    assert!(matches!(err, HarvestError::Cancelled));

    let store = OfferStore::open(&db_path, "offers").unwrap();
    assert_eq!(store.count_rows().unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &dir.path().join("offers.db"));
    config.storage.database_path = String::new();

    let err = run_pipeline(&config, CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage(), "configuration");
}

#[tokio::test]
async fn test_cache_serves_repeated_page_requests() {
    let server = MockServer::start().await;

    // The probe and the page fetch both ask for page 1; the cache answers the second
    Mock::given(method("GET"))
        .and(path("/offers"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(1, 2, json!({"totalPages": 1}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &dir.path().join("offers.db"));
    config.cache.enabled = true;
    config.cache.path = dir.path().join("cache.sqlite").to_string_lossy().to_string();

    let report = run_pipeline(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.rows_written, 2);
}
