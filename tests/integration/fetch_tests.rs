use crate::common::{mount_pages, page_body, test_config};
use offer_harvest::fetcher::{build_transport, resolve_page_count, FetchOrchestrator, PageFetcher};
use offer_harvest::FetchError;
use serde_json::json;
use std::collections::HashSet;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> PageFetcher {
    let config = test_config(server, std::path::Path::new("/unused.db"));
    let transport = build_transport(&config).unwrap();
    PageFetcher::from_config(&config, transport).unwrap()
}

#[tokio::test]
async fn test_three_503_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 2, json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let page = fetcher_for(&server).fetch(1).await.unwrap();
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch(2).await.unwrap_err();
    match err {
        FetchError::RetriesExhausted {
            attempts,
            last_status,
            url,
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(last_status, Some(502));
            assert!(url.ends_with("/offers?page=2"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch(1).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::RequestFailed {
            status: Some(404),
            ..
        }
    ));
}

#[tokio::test]
async fn test_html_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>maintenance</html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch(1).await.unwrap_err();
    assert!(matches!(err, FetchError::ResponseMalformed { .. }));
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let server = MockServer::start().await;
    let mut config = test_config(&server, std::path::Path::new("/unused.db"));

    // Grab a free port, then close it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    config.api.base_url = format!("http://127.0.0.1:{port}/offers");

    let transport = build_transport(&config).unwrap();
    let fetcher = PageFetcher::from_config(&config, transport).unwrap();

    let err = fetcher.fetch(1).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::RetriesExhausted {
            last_status: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_page_count_from_total_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(1, 20, json!({"totalItems": 95}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(resolve_page_count(&fetcher_for(&server), None, 1000).await, 5);
}

#[tokio::test]
async fn test_page_count_without_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 3, json!({}))))
        .mount(&server)
        .await;

    assert_eq!(resolve_page_count(&fetcher_for(&server), None, 1000).await, 1);
}

#[tokio::test]
async fn test_orchestrator_visits_each_page_once() {
    let server = MockServer::start().await;
    mount_pages(&server, 6, 2).await;

    let mut orchestrator = FetchOrchestrator::new(
        fetcher_for(&server),
        1000,
        (std::time::Duration::ZERO, std::time::Duration::ZERO),
    );
    let batch = orchestrator.run_fetch(None).await.unwrap();

    assert_eq!(batch.len(), 12);
    assert_eq!(batch.pages.len(), 6);
    let distinct: HashSet<u32> = batch.pages.iter().copied().collect();
    assert_eq!(distinct, (1..=6).collect::<HashSet<u32>>());
}
