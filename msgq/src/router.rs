//! HTTP router for msgq

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use msgq_queue::{handlers, QueueState};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::QueueConfig;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Largest request body accepted for a given message content limit.
///
/// JSON escaping can turn one content byte into six (`\u0000`).
pub fn request_body_limit(max_content_bytes: usize) -> usize {
    max_content_bytes.saturating_mul(6).saturating_add(64 * 1024)
}

/// Create the main application router
pub fn create_router(state: Arc<QueueState>, queue: &QueueConfig) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    Router::new()
        .route("/health", get(health_check))
        // Queue listing
        .route("/api", get(handlers::list_queues))
        .route("/api/", get(handlers::list_queues))
        // Messages
        .route("/api/create", post(handlers::create_message))
        .route("/api/:queue_name", get(handlers::queue_action))
        // Summaries
        .route("/summary", get(handlers::queue_summaries))
        .route("/summary/:queue_name", get(handlers::queue_summary))
        .layer(DefaultBodyLimit::max(request_body_limit(queue.max_content_bytes)))
        .layer(trace_layer)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(Health { status: "running" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_escaped_content() {
        assert_eq!(request_body_limit(0), 64 * 1024);
        assert_eq!(request_body_limit(262_144), 262_144 * 6 + 64 * 1024);
        assert_eq!(request_body_limit(usize::MAX), usize::MAX);
    }
}
