//! # Item Handlers
//!
//! CRUD over stored items plus the synchronous bulk-processing trigger.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::Item;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// List items: GET /api/items
pub async fn list_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Item>>> {
    let items = state.service.find_all().await?;
    Ok(Json(items))
}

/// Create item: POST /api/items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Item>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let Json(item) = payload?;
    let created = state.service.create(item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get item: GET /api/items/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Item>> {
    if id <= 0 {
        return Err(ApiError::bad_request(format!("id must be greater than 0, got {id}")));
    }

    state
        .service
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { id })
}

/// Replace item: PUT /api/items/{id}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<Item>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    let Json(item) = payload?;
    let updated = state.service.update(id, item).await?;
    Ok(Json(updated))
}

/// Delete item: DELETE /api/items/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run one batch over every item: GET /api/items/process
///
/// Responds only after every item in the batch has finished.
pub async fn process_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Item>>> {
    debug!("Bulk processing requested");

    let outcome = state.service.process_items().await?;

    let summary = outcome.summary();
    info!(
        batch_id = %outcome.batch_id(),
        submitted = summary.submitted,
        processed = summary.processed,
        "Bulk processing request completed"
    );

    Ok(Json(outcome.into_items()))
}
