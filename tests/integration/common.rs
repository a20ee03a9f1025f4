use offer_harvest::config::Config;
use serde_json::{json, Value};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointed at the mock server with all waiting disabled
pub fn test_config(server: &MockServer, db_path: &Path) -> Config {
    let mut config = Config::new(
        format!("{}/offers", server.uri()),
        db_path.to_string_lossy().to_string(),
    );
    config.api.timeout_secs = 5;
    config.fetcher.min_delay_ms = 0;
    config.fetcher.max_delay_ms = 0;
    config.fetcher.retries = 3;
    config.fetcher.backoff_min = 0.0;
    config.fetcher.backoff_max = 0.0;
    config
}

/// A raw offer as the listing API returns it
pub fn raw_offer(page: u32, index: u32) -> Value {
    json!({
        "slug": format!(" offer-{page}-{index} "),
        "title": format!("Offer {index} on page {page}"),
        "requiredSkills": ["python", "sql"],
        "niceToHaveSkills": null,
        "workplaceType": "hybrid",
        "workingTime": "full_time",
        "experienceLevel": "mid",
        "employmentTypes": [{"type": "permanent", "currency": "pln"}],
        "categoryId": 5,
        "multilocation": [{"city": "Kraków", "slug": format!("offer-{page}-{index}")}],
        "city": "Kraków",
        "street": "Rynek 1",
        "latitude": 50.0614,
        "longitude": 19.9366,
        "remoteInterview": index % 2 == 0,
        "companyName": "Acme",
        "companyLogoThumbUrl": "https://cdn.example.com/acme.png",
        "publishedAt": "2024-05-01T10:00:00Z",
        "languages": [{"code": "pl", "level": "c1"}]
    })
}

/// Page body with `per_page` offers and the given metadata
pub fn page_body(page: u32, per_page: u32, meta: Value) -> Value {
    let offers: Vec<Value> = (0..per_page).map(|i| raw_offer(page, i)).collect();
    json!({ "data": offers, "meta": meta })
}

/// Serves pages `1..=pages`, each with `per_page` offers, reporting `totalPages`
pub async fn mount_pages(server: &MockServer, pages: u32, per_page: u32) {
    for page in 1..=pages {
        Mock::given(method("GET"))
            .and(path("/offers"))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(page, per_page, json!({"totalPages": pages}))),
            )
            .mount(server)
            .await;
    }
}
