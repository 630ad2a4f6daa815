use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use service::listing::{Listing, ListingInput, ListingPatch};
use service::storage::ListingPage;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// POST /property
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<ListingInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), JsonApiError> {
    let listing = state
        .store
        .create(input)
        .await
        .map_err(JsonApiError::from_service)?;
    info!(property_id = %listing.property_id, "property created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "property created" })),
    ))
}

/// GET /property/:id
pub async fn fetch(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, JsonApiError> {
    match state.store.fetch(&id).await {
        Some(listing) => Ok(Json(listing)),
        None => Err(JsonApiError::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            Some(format!("no property with id {id}")),
        )),
    }
}

/// PUT /property/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<ListingPatch>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    state
        .store
        .update(&id, patch)
        .await
        .map_err(JsonApiError::from_service)?;
    info!(property_id = %id, "property updated");
    Ok(Json(serde_json::json!({ "message": "property updated" })))
}

/// DELETE /property/:id
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    state
        .store
        .delete(&id)
        .await
        .map_err(JsonApiError::from_service)?;
    info!(property_id = %id, "property deleted");
    Ok(Json(serde_json::json!({ "message": "property deleted" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Exclusive-start cursor: the last `PropertyID` of the previous page.
    pub after: Option<String>,
}

/// GET /properties
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Json<ListingPage> {
    Json(state.store.scan(query.after.as_deref()).await)
}
