use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::api::root))
        .route("/health", get(handlers::api::health_check))
        .route("/query", post(handlers::api::text_to_query))
        .route("/simple-query", post(handlers::api::simple_text_to_query))
}
