//! User route handlers.

use axum::{Json, extract::State};

use slh_shop_core::UserId;
use slh_shop_core::models::{Order, Shop, SyncUser, User};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// Upsert a user by Telegram id.
pub async fn sync(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SyncUser>,
) -> Result<Json<User>> {
    let user = state.directory().sync_user(&payload).await?;
    Ok(Json(user))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    Ok(Json(state.directory().user(id).await?))
}

/// Shops owned by the user, oldest first.
pub async fn shops(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<Vec<Shop>>> {
    Ok(Json(state.directory().shops_of(id).await?))
}

/// Orders placed by the user, oldest first.
pub async fn orders(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.directory().orders_of(id).await?))
}

/// Return the user's first shop, creating the default shop if needed.
pub async fn default_shop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<Shop>> {
    Ok(Json(state.directory().ensure_default_shop(id).await?))
}
