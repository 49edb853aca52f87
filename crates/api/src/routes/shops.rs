//! Shop and item route handlers.

use axum::{Json, extract::State, http::StatusCode};

use slh_shop_core::models::{CreateItem, CreateShop, Item, Shop};
use slh_shop_core::{ItemId, ShopId};

use crate::error::{Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateShop>,
) -> Result<(StatusCode, Json<Shop>)> {
    let shop = state.directory().create_shop(&request).await?;
    add_breadcrumb("shop", "Shop created", &[("shop_id", shop.id.to_string())]);
    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ShopId>,
) -> Result<Json<Shop>> {
    Ok(Json(state.directory().shop(id).await?))
}

/// Resolve a deep-link referral code.
pub async fn by_referral(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<Shop>> {
    Ok(Json(state.directory().shop_by_referral(&code).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
    ApiJson(request): ApiJson<CreateItem>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = state.directory().create_item(shop_id, &request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Items of a shop, oldest first.
pub async fn items(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Vec<Item>>> {
    Ok(Json(state.directory().items_of(shop_id).await?))
}

/// Return the shop's first item, creating the demo card if needed.
pub async fn default_item(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Item>> {
    Ok(Json(state.directory().ensure_default_item(shop_id).await?))
}

pub async fn show_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<Json<Item>> {
    Ok(Json(state.directory().item(id).await?))
}
