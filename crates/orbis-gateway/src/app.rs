use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    delete_country_handler, get_country_handler, health_handler, list_countries_handler,
    refresh_handler, status_handler, summary_image_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/status", get(status_handler))
            .route("/countries", get(list_countries_handler))
            .route("/countries/refresh", post(refresh_handler))
            .route("/countries/image", get(summary_image_handler))
            .route(
                "/countries/{name}",
                get(get_country_handler).delete(delete_country_handler),
            )
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}
