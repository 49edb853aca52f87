//! SLH Shop Core API.
//!
//! REST backend for Telegram-identified users, their shops and items, and
//! orders settled in SLH or BNB with manually reviewed payment proofs.
//! Exposed as a library so the router can be exercised in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, StatusCode},
};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use services::proofs::PROOF_URL_PREFIX;
use state::AppState;

/// Per-request timeout applied to every route.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the full application router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    let upload_dir = state.config().upload_dir.clone();

    Router::new()
        .merge(routes::routes())
        .nest_service(PROOF_URL_PREFIX, ServeDir::new(upload_dir))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
