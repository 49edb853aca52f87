//! Entity records and request payloads.
//!
//! These are the JSON shapes exchanged between the API and its clients.
//! With the `postgres` feature the records also decode directly from rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    ItemId, OrderId, OrderStatus, PaymentInstructions, PaymentMethod, ShopId, ShopStatus,
    ShopType, UserId,
};

/// A shop user, identified externally by their Telegram account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub telegram_id: i64,
    pub telegram_username: Option<String>,
    pub display_name: Option<String>,
    pub bnb_address: Option<String>,
    pub ton_address: Option<String>,
    /// Owner of the shop whose referral link brought this user in.
    pub referrer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shop owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Shop {
    pub id: ShopId,
    pub owner_user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    /// URL-safe, globally unique, immutable.
    pub slug: String,
    pub shop_type: ShopType,
    pub status: ShopStatus,
    /// Globally unique code used in `start=shop_<code>` deep links.
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Item {
    pub id: ItemId,
    pub shop_id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_slh: Option<Decimal>,
    pub price_bnb: Option<Decimal>,
    /// Fiat (NIS) equivalent, display only.
    pub price_nis: Option<Decimal>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Price in the given settlement currency, if the item has one.
    #[must_use]
    pub const fn price_for(&self, method: PaymentMethod) -> Option<Decimal> {
        match method {
            PaymentMethod::Slh => self.price_slh,
            PaymentMethod::Bnb => self.price_bnb,
        }
    }
}

/// An order for a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    pub buyer_user_id: UserId,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub amount_slh: Option<Decimal>,
    pub amount_bnb: Option<Decimal>,
    pub status: OrderStatus,
    /// Reserved for on-chain verification; no current flow sets it.
    pub tx_hash: Option<String>,
    /// Location of the uploaded payment proof.
    pub payment_proof_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Settlement currency and amount, taken from whichever amount is set.
    #[must_use]
    pub const fn settlement(&self) -> Option<(PaymentMethod, Decimal)> {
        match (self.amount_slh, self.amount_bnb) {
            (Some(amount), _) => Some((PaymentMethod::Slh, amount)),
            (None, Some(amount)) => Some((PaymentMethod::Bnb, amount)),
            (None, None) => None,
        }
    }
}

/// Response of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithPayment {
    pub order: Order,
    pub payment_instructions: PaymentInstructions,
}

/// Body of `POST /users/sync`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncUser {
    pub telegram_id: i64,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Referral code of the shop the user arrived from, if any.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Body of `POST /shops`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShop {
    pub owner_user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shop_type: ShopType,
}

/// Body of `POST /shops/{id}/items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price_slh: Option<Decimal>,
    #[serde(default)]
    pub price_bnb: Option<Decimal>,
    #[serde(default)]
    pub price_nis: Option<Decimal>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub buyer_user_id: UserId,
    pub shop_id: ShopId,
    pub item_id: ItemId,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// How the target order of a proof upload was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofTarget {
    /// The caller named the order.
    Explicit,
    /// Fallback: the buyer's most recently created order.
    LatestForBuyer,
}

/// Response of `POST /payments/upload-proof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofReceipt {
    pub order_id: OrderId,
    pub resolved_by: ProofTarget,
    pub status: OrderStatus,
    pub payment_proof_url: String,
}

/// Structured error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Machine-readable code plus a human message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
