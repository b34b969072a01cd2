//! HTTP server for the support chat API.
//!
//! Endpoints:
//! - GET  /api/status - Health check
//! - POST /api/support/chat - One support turn
//! - GET  /api/support/conversations/{id} - Point lookup
//! - POST /api/support/conversations/{id}/assign - Hand to an agent
//! - POST /api/support/conversations/{id}/resolve - Close out
//! - GET  /api/support/analytics - Read-only aggregation surface

mod handlers;
pub mod types;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
pub use types::API_VERSION;

/// Max request body size for the chat endpoint (64KB covers any real
/// support message plus metadata).
const CHAT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Whole-request deadline; generous next to the per-backend timeouts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route(
            "/api/support/chat",
            post(handlers::chat_handler).layer(DefaultBodyLimit::max(CHAT_MAX_BODY_BYTES)),
        )
        .route(
            "/api/support/conversations/{id}",
            get(handlers::conversation_handler),
        )
        .route(
            "/api/support/conversations/{id}/assign",
            post(handlers::assign_handler),
        )
        .route(
            "/api/support/conversations/{id}/resolve",
            post(handlers::resolve_handler),
        )
        .route("/api/support/analytics", get(handlers::analytics_handler))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(version_header)
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(host: &str, port: u16, state: AppState) -> Result<()> {
    let app = create_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Support API listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
