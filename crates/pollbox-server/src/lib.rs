//! HTTP surface of the pollbox backend.
//!
//! Handlers translate requests into [`pollbox_polls::PollRepository`] calls.
//! Each request runs its database work on the blocking pool inside its own
//! [`pollbox_db::ConnectionScope`].

pub mod api;
pub mod config;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use pollbox_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/polls", get(api::list_polls_handler))
        .route("/api/polls/{pollId}", get(api::get_poll_handler))
        .route("/api/polls/{pollId}/results", get(api::results_handler))
        .route(
            "/api/polls/{pollId}/options/{optionId}/vote",
            post(api::vote_handler),
        )
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
}
