use crate::error::Result;
use crate::model::StatusResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let status = state.catalog().status().await?;
    Ok(Json(status.into()))
}
