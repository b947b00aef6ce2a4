use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::error::{CatalogError, Result};

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies which upstream resource a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Countries,
    ExchangeRates,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Countries => write!(f, "countries"),
            SourceKind::ExchangeRates => write!(f, "exchange rates"),
        }
    }
}

/// Both upstream payloads of one refresh.
///
/// Country entries are kept as raw JSON so that one malformed entry can be
/// skipped without rejecting the whole listing.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub countries: Vec<Value>,
    /// Currency code to rate against the table's base currency.
    pub rates: HashMap<String, f64>,
}

/// Retrieves the two external datasets a refresh is built from.
#[async_trait]
pub trait SourceFetcher: Send + Sync + 'static {
    /// Fetches both datasets. Either both succeed or the whole fetch fails
    /// with [`CatalogError::UpstreamUnavailable`].
    async fn fetch(&self) -> Result<SourceSnapshot>;
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct SourceEndpoints {
    #[builder(default = DEFAULT_COUNTRIES_URL.to_string(), setter(into))]
    pub countries_url: String,
    #[builder(default = DEFAULT_RATES_URL.to_string(), setter(into))]
    pub rates_url: String,
    /// Applied to each request separately.
    #[builder(default = DEFAULT_FETCH_TIMEOUT)]
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: HashMap<String, f64>,
}

/// [`SourceFetcher`] issuing both GET requests concurrently over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
    endpoints: SourceEndpoints,
}

impl HttpSourceFetcher {
    pub fn new(endpoints: SourceEndpoints) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .build()
            .map_err(|e| CatalogError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client, endpoints })
    }

    async fn get_json<T: DeserializeOwned>(&self, source: SourceKind, url: &str) -> Result<T> {
        let unavailable = |err: reqwest::Error| {
            warn!(endpoint = %source, url, error = %err, timed_out = err.is_timeout(), "upstream request failed");
            CatalogError::UpstreamUnavailable {
                endpoint: source,
                message: format!("could not fetch data from {url}: {err}"),
            }
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable)?;

        let body = response.json::<T>().await.map_err(unavailable)?;
        debug!(endpoint = %source, url, "upstream payload received");
        Ok(body)
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self) -> Result<SourceSnapshot> {
        let (countries, rates) = tokio::try_join!(
            self.get_json::<Vec<Value>>(SourceKind::Countries, &self.endpoints.countries_url),
            self.get_json::<RatesPayload>(SourceKind::ExchangeRates, &self.endpoints.rates_url),
        )?;

        Ok(SourceSnapshot {
            countries,
            rates: rates.rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetcher_for(server: &MockServer, timeout: Duration) -> HttpSourceFetcher {
        HttpSourceFetcher::new(
            SourceEndpoints::builder()
                .countries_url(format!("{}/countries", server.uri()))
                .rates_url(format!("{}/rates", server.uri()))
                .timeout(timeout)
                .build(),
        )
        .unwrap()
    }

    async fn mount_json(server: &MockServer, at: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetches_both_sources() {
        let server = MockServer::start().await;
        mount_json(&server, "/countries", json!([{ "name": "Wakanda" }, 42])).await;
        mount_json(&server, "/rates", json!({ "result": "success", "rates": { "WKD": 10 } })).await;

        let snapshot = fetcher_for(&server, DEFAULT_FETCH_TIMEOUT)
            .await
            .fetch()
            .await
            .unwrap();

        assert_eq!(snapshot.countries.len(), 2);
        assert_eq!(snapshot.rates.get("WKD"), Some(&10.0));
    }

    #[tokio::test]
    async fn server_error_on_rates_fails_whole_fetch() {
        let server = MockServer::start().await;
        mount_json(&server, "/countries", json!([])).await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher_for(&server, DEFAULT_FETCH_TIMEOUT)
            .await
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::UpstreamUnavailable {
                endpoint: SourceKind::ExchangeRates,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn slow_countries_source_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countries"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        mount_json(&server, "/rates", json!({ "rates": {} })).await;

        let err = fetcher_for(&server, Duration::from_millis(200))
            .await
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::UpstreamUnavailable {
                endpoint: SourceKind::Countries,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_payload_is_reported_as_unavailable() {
        let server = MockServer::start().await;
        mount_json(&server, "/countries", json!({ "not": "a list" })).await;
        mount_json(&server, "/rates", json!({ "rates": {} })).await;

        let err = fetcher_for(&server, DEFAULT_FETCH_TIMEOUT)
            .await
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::UpstreamUnavailable {
                endpoint: SourceKind::Countries,
                ..
            }
        ));
    }
}
