mod country;
mod health;

pub use country::{ListCountriesQuery, RefreshResponse, StatusResponse};
pub use health::HealthResponse;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &'static str) -> Self {
        Self {
            error,
            details: None,
        }
    }

    pub fn with_details(error: &'static str, details: impl Into<String>) -> Self {
        Self {
            error,
            details: Some(details.into()),
        }
    }
}
