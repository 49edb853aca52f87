//! Persistence for users, shops, items and orders.
//!
//! # Tables
//!
//! - `users` - Telegram-identified users (`telegram_id` unique)
//! - `shops` - Shops with unique `slug` and `referral_code`
//! - `items` - Items with optional SLH/BNB/NIS prices and JSONB metadata
//! - `orders` - Orders and their payment-proof lifecycle
//!
//! # Backends
//!
//! [`Store`] is implemented by [`PgStore`] for production and by
//! [`MemoryStore`] for tests and local development without a database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p slh-shop-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use slh_shop_core::models::{Item, Order, Shop, User};
use slh_shop_core::{ItemId, OrderId, ShopId, ShopType, UserId};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A referenced entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Profile fields applied by the user upsert.
///
/// `None` means "keep the stored value". Callers normalize empty strings to
/// `None` before building this.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub telegram_username: Option<String>,
    pub display_name: Option<String>,
    /// Only applied when the user is created.
    pub referrer_id: Option<UserId>,
}

/// A shop row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub owner_user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub shop_type: ShopType,
    pub referral_code: String,
}

/// An item row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub shop_id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_slh: Option<Decimal>,
    pub price_bnb: Option<Decimal>,
    pub price_nis: Option<Decimal>,
    pub metadata: serde_json::Value,
}

/// An order row about to be inserted with status `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_user_id: UserId,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub amount_slh: Option<Decimal>,
    pub amount_bnb: Option<Decimal>,
}

/// Storage contract for the shop domain.
///
/// Lists are returned in creation order (oldest first). Every mutating call
/// is a single atomic statement in the Postgres backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user or update the existing one with the same `telegram_id`.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the slug or referral code is taken.
    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError>;

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError>;

    async fn get_shop_by_referral(&self, code: &str) -> Result<Option<Shop>, RepositoryError>;

    async fn list_shops_by_owner(&self, owner: UserId) -> Result<Vec<Shop>, RepositoryError>;

    async fn insert_item(&self, item: &NewItem) -> Result<Item, RepositoryError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    async fn list_items_by_shop(&self, shop: ShopId) -> Result<Vec<Item>, RepositoryError>;

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// The buyer's most recently created order.
    ///
    /// Orders sharing a `created_at` are ordered by id, highest first.
    async fn latest_order_for_buyer(&self, buyer: UserId)
    -> Result<Option<Order>, RepositoryError>;

    async fn list_orders_by_buyer(&self, buyer: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Record a proof location and move the order to `waiting_verification`.
    ///
    /// Only applies to orders whose status accepts a proof; returns `None`
    /// when no such order matched.
    async fn attach_proof(
        &self,
        id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Set the order status to `paid` regardless of its current status.
    async fn mark_paid(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Expire every `pending` order created before `cutoff`. Returns the count.
    async fn expire_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;

    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}
