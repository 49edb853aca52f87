//! Liveness, readiness and service metadata.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub name: &'static str,
    pub version: &'static str,
    pub chain_id: u64,
    pub token_address: String,
    pub symbol: &'static str,
}

/// Static description of the service and its settlement network.
pub async fn meta(State(state): State<AppState>) -> Json<Meta> {
    let payment = &state.config().payment;
    Json(Meta {
        name: "SLH Shop Core",
        version: env!("CARGO_PKG_VERSION"),
        chain_id: payment.chain_id,
        token_address: payment.slh_address.clone(),
        symbol: "SLH",
    })
}
