//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;

use crate::state::AppState;
use axum::{
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/customers", get(handlers::customers::list_customers))
        .route(
            "/stores/:store_id/customers",
            get(handlers::customers::list_store_customers),
        )
        .with_state(state)
        // applied in reverse order: tracing wraps request ids
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::trace())
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
