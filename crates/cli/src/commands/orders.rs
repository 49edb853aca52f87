//! Order operations.
//!
//! # Usage
//!
//! ```bash
//! slh-cli orders approve <order-id>
//! slh-cli orders expire [--ttl-minutes N]
//! ```
//!
//! # Environment Variables
//!
//! Same as the API server; see `slh_shop_api::config`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use slh_shop_api::config::{ApiConfig, ConfigError, MAX_ORDER_TTL_MINUTES, OrderPolicy};
use slh_shop_api::db::{self, PgStore};
use slh_shop_api::services::{OrderLifecycle, ProofStore, ServiceError};
use slh_shop_core::OrderId;

#[derive(Debug, Error)]
pub enum OrderCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("TTL must be between 1 and {MAX_ORDER_TTL_MINUTES} minutes, got {0}")]
    InvalidTtl(u64),
}

/// Explicit `--ttl-minutes`, or the configured policy TTL.
fn expiry_ttl(
    ttl_minutes: Option<u64>,
    configured: Duration,
) -> Result<Duration, OrderCommandError> {
    match ttl_minutes {
        Some(minutes) => {
            OrderPolicy::ttl_from_minutes(minutes).ok_or(OrderCommandError::InvalidTtl(minutes))
        }
        None => Ok(configured),
    }
}

async fn lifecycle(config: &ApiConfig) -> Result<OrderLifecycle, OrderCommandError> {
    tracing::info!("Connecting to shop database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok(OrderLifecycle::new(
        Arc::new(PgStore::new(pool)),
        config.payment.clone(),
        ProofStore::new(&config.upload_dir),
    ))
}

/// Mark an order as paid.
pub async fn approve(id: OrderId) -> Result<(), OrderCommandError> {
    let config = ApiConfig::from_env()?;
    let order = lifecycle(&config).await?.approve(id).await?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        proof = order.payment_proof_url.as_deref().unwrap_or("-"),
        "Order approved"
    );
    Ok(())
}

/// Expire pending orders older than `ttl_minutes` (or the configured TTL).
pub async fn expire(ttl_minutes: Option<u64>) -> Result<(), OrderCommandError> {
    let config = ApiConfig::from_env()?;
    let ttl = expiry_ttl(ttl_minutes, config.orders.ttl)?;

    let expired = lifecycle(&config).await?.expire_stale(ttl).await?;

    tracing::info!(expired, ttl_secs = ttl.as_secs(), "Stale orders expired");
    Ok(())
}
