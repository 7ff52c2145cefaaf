//! Route definitions grouped by functionality.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::web::{handlers, state::AppState};

/// Health check route for monitoring and load balancers
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Item management and bulk processing
pub fn item_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route("/api/items/process", get(handlers::items::process_items))
        .route(
            "/api/items/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
}
