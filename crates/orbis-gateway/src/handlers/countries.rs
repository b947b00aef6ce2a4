use crate::error::Result;
use crate::model::{ListCountriesQuery, RefreshResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use orbis_core::CountryRecord;
use tracing::info;

pub async fn refresh_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RefreshResponse>)> {
    let outcome = state.catalog().refresh().await?;
    info!(
        records_fetched = outcome.records_fetched,
        total = outcome.total,
        "catalog refreshed"
    );
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

pub async fn list_countries_handler(
    State(state): State<AppState>,
    Query(query): Query<ListCountriesQuery>,
) -> Result<Json<Vec<CountryRecord>>> {
    let (filter, sort) = query.into_parts();
    Ok(Json(state.catalog().list(filter, sort).await?))
}

pub async fn get_country_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CountryRecord>> {
    Ok(Json(state.catalog().get(&name).await?))
}

pub async fn delete_country_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.catalog().delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary_image_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let bytes = state.catalog().summary_image().await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
