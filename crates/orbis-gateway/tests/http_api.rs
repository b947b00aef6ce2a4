use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use orbis_catalog::{
    CatalogService, FixedMultiplier, GdpEstimator, HttpSourceFetcher, RefreshOrchestrator,
    SourceEndpoints, SummaryArtifact,
};
use orbis_gateway::{App, AppState};
use orbis_storage::InMemoryCatalog;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    _upstream: MockServer,
    _cache: TempDir,
}

fn countries() -> Value {
    json!([
        {
            "name": "Japan",
            "capital": "Tokyo",
            "region": "Asia",
            "population": 125_000_000,
            "flag": "https://flags.example/jp.svg",
            "currencies": [{ "code": "JPY", "name": "Japanese yen", "symbol": "¥" }]
        },
        {
            "name": "Nepal",
            "capital": "Kathmandu",
            "region": "Asia",
            "population": 30_000_000,
            "currencies": [{ "code": "NPR" }]
        },
        {
            "name": "Chad",
            "region": "Africa",
            "population": 17_000_000,
            "currencies": [{ "code": "XAF" }]
        },
        { "name": "Nowhere" }
    ])
}

async fn spawn_app(rates_status: u16) -> TestApp {
    spawn_app_with(rates_status, false).await
}

/// With `blocked_cache`, the cache directory is a regular file, so the
/// summary image cannot be written.
async fn spawn_app_with(rates_status: u16, blocked_cache: bool) -> TestApp {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(countries()))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/rates"))
        .respond_with(
            ResponseTemplate::new(rates_status)
                .set_body_json(json!({ "rates": { "JPY": 150.0, "NPR": 133.0, "XAF": 600.0 } })),
        )
        .mount(&upstream)
        .await;

    let cache = tempfile::tempdir().unwrap();
    let cache_dir = if blocked_cache {
        let blocker = cache.path().join("cache");
        std::fs::write(&blocker, b"not a directory").unwrap();
        blocker
    } else {
        cache.path().to_path_buf()
    };
    let fetcher = HttpSourceFetcher::new(
        SourceEndpoints::builder()
            .countries_url(format!("{}/countries", upstream.uri()))
            .rates_url(format!("{}/rates", upstream.uri()))
            .build(),
    )
    .unwrap();

    let refresher = RefreshOrchestrator::builder()
        .catalog(Arc::new(InMemoryCatalog::new()))
        .fetcher(fetcher)
        .artifact(SummaryArtifact::in_dir(&cache_dir))
        .estimator(GdpEstimator::with_source(1000.0, 2000.0, FixedMultiplier(1500.0)).unwrap())
        .build();
    let state = AppState::new(Arc::new(CatalogService::new(refresher)));

    TestApp {
        router: App::router(state),
        _upstream: upstream,
        _cache: cache,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec(), content_type)
    }

    async fn json(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = self.send(method, uri).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

fn names(listing: &Value) -> Vec<&str> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_ok() {
    let app = spawn_app(200).await;

    let (status, body) = app.json(Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn refresh_then_query_the_catalog() {
    let app = spawn_app(200).await;

    let (status, body) = app.json(Method::POST, "/countries/refresh").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "message": "Countries refreshed successfully.", "total_updated": 4 })
    );

    let (status, body) = app
        .json(Method::GET, "/countries?region=asia&sort=population_desc")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Japan", "Nepal"]);

    let (status, body) = app.json(Method::GET, "/countries/japan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Japan");
    assert_eq!(body["currency_code"], "JPY");
    assert_eq!(body["exchange_rate"], 150.0);
    assert_eq!(body["estimated_gdp"], 1_250_000_000_000.0);
    assert!(body["last_refreshed_at"].is_string());

    let (status, body) = app.json(Method::GET, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_countries"], 3);
    assert!(body["last_refreshed_at"].is_string());

    let (status, bytes, content_type) = app.send(Method::GET, "/countries/image").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(bytes.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn currency_filter_and_unknown_sort() {
    let app = spawn_app(200).await;
    app.json(Method::POST, "/countries/refresh").await;

    let (status, body) = app.json(Method::GET, "/countries?currency=XAF").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Chad"]);

    let (status, body) = app.json(Method::GET, "/countries?sort=area_desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn delete_country_then_it_is_gone() {
    let app = spawn_app(200).await;
    app.json(Method::POST, "/countries/refresh").await;

    let (status, body) = app.json(Method::DELETE, "/countries/Chad").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.json(Method::DELETE, "/countries/Chad").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Country not found" }));

    let (_, body) = app.json(Method::GET, "/status").await;
    assert_eq!(body["total_countries"], 2);
}

#[tokio::test]
async fn unknown_country_is_not_found() {
    let app = spawn_app(200).await;

    let (status, body) = app.json(Method::GET, "/countries/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Country not found" }));
}

#[tokio::test]
async fn image_is_not_found_before_first_refresh() {
    let app = spawn_app(200).await;

    let (status, body) = app.json(Method::GET, "/countries/image").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Summary image not found" }));
}

#[tokio::test]
async fn failing_upstream_is_service_unavailable() {
    let app = spawn_app(500).await;

    let (status, body) = app.json(Method::POST, "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "External data source unavailable");
    assert_eq!(
        body["details"],
        "Could not fetch data from the exchange rates source"
    );

    let (_, body) = app.json(Method::GET, "/status").await;
    assert_eq!(body, json!({ "total_countries": 0, "last_refreshed_at": null }));
}

#[tokio::test]
async fn unwritable_summary_image_is_internal_error() {
    let app = spawn_app_with(200, true).await;

    let (status, body) = app.json(Method::POST, "/countries/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body["details"].is_string());

    let (_, body) = app.json(Method::GET, "/status").await;
    assert_eq!(body, json!({ "total_countries": 0, "last_refreshed_at": null }));

    let (status, _) = app.json(Method::GET, "/countries/Japan").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
