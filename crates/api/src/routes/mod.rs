//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (store ping)
//! GET  /meta                        - Service metadata
//!
//! # Users
//! POST /users/sync                  - Upsert by Telegram id
//! GET  /users/{id}                  - User
//! GET  /users/{id}/shops            - Shops owned by the user
//! GET  /users/{id}/orders           - Orders placed by the user
//! POST /users/{id}/shops/default    - Ensure the user has a shop
//!
//! # Shops and items
//! POST /shops                       - Create shop
//! GET  /shops/{id}                  - Shop
//! GET  /shops/by-referral/{code}    - Shop by referral code
//! POST /shops/{id}/items            - Create item
//! GET  /shops/{id}/items            - Items of a shop
//! POST /shops/{id}/items/default    - Ensure the shop has an item
//! GET  /items/{id}                  - Item
//!
//! # Orders and payments
//! POST /orders                      - Create order + payment instructions
//! GET  /orders/{id}                 - Order
//! POST /payments/upload-proof       - Multipart proof upload
//! POST /payments/approve/{id}       - Mark paid (operator)
//! GET  /uploaded_proofs/{name}      - Stored proof files
//! ```

pub mod health;
pub mod orders;
pub mod shops;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted proof upload.
pub const MAX_PROOF_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the health and metadata routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/healthz", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/meta", get(health::meta))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(users::sync))
        .route("/telegram-sync", post(users::sync))
        .route("/{id}", get(users::show))
        .route("/{id}/shops", get(users::shops))
        .route("/{id}/shops/default", post(users::default_shop))
        .route("/{id}/orders", get(users::orders))
}

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(shops::create))
        .route("/{id}", get(shops::show))
        .route("/by-owner/{id}", get(users::shops))
        .route("/by-referral/{code}", get(shops::by_referral))
        .route("/{id}/items", get(shops::items).post(shops::create_item))
        .route("/{id}/items/default", post(shops::default_item))
}

/// Create the order and payment routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::create))
        .route("/orders/{id}", get(orders::show))
        .route("/items/{id}", get(shops::show_item))
        .route(
            "/payments/upload-proof",
            post(orders::upload_proof).layer(DefaultBodyLimit::max(MAX_PROOF_UPLOAD_BYTES)),
        )
        .route("/payments/approve/{id}", post(orders::approve))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(order_routes())
        .nest("/users", user_routes())
        .nest("/shops", shop_routes())
}
