use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orbis_catalog::CatalogError;
use thiserror::Error;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Catalog(err) = self;

        let (status, body) = match &err {
            CatalogError::UpstreamUnavailable { endpoint, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::with_details(
                    "External data source unavailable",
                    format!("Could not fetch data from the {endpoint} source"),
                ),
            ),
            CatalogError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("Country not found"),
            ),
            CatalogError::ArtifactNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("Summary image not found"),
            ),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Internal server error", other.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
