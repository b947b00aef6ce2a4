use jiff::Timestamp;
use orbis_catalog::{CatalogStatus, RefreshOutcome};
use orbis_core::{CountryFilter, SortOrder};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REFRESHED_MESSAGE: &str = "Countries refreshed successfully.";

/// Query string of `GET /countries`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListCountriesQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ListCountriesQuery {
    /// Splits the query into a filter and an ordering. An unrecognised sort
    /// key is ignored and the listing is left unordered.
    pub fn into_parts(self) -> (CountryFilter, Option<SortOrder>) {
        let sort = present(self.sort).and_then(|raw| match raw.parse::<SortOrder>() {
            Ok(sort) => Some(sort),
            Err(err) => {
                debug!(%err, "ignoring sort parameter");
                None
            }
        });

        let filter = CountryFilter {
            region: present(self.region),
            currency: present(self.currency),
        };

        (filter, sort)
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: &'static str,
    /// Entries in the upstream listing, skipped ones included.
    pub total_updated: usize,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        Self {
            message: REFRESHED_MESSAGE,
            total_updated: outcome.records_fetched,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    pub last_refreshed_at: Option<Timestamp>,
}

impl From<CatalogStatus> for StatusResponse {
    fn from(status: CatalogStatus) -> Self {
        Self {
            total_countries: status.total_countries,
            last_refreshed_at: status.last_refreshed_at,
        }
    }
}
