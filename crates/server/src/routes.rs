use axum::{
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::state::ServerState;

pub mod properties;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health probe plus the property CRUD
/// surface, with CORS and request tracing layered on.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/property", axum::routing::post(properties::create))
        .route(
            "/property/:id",
            get(properties::fetch)
                .put(properties::update)
                .delete(properties::remove),
        )
        .route("/properties", get(properties::list))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
