//! Status enums for shops and orders.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// ```text
/// pending ──proof──▶ waiting_verification ──approve──▶ paid
///    │                                                  ▲
///    └────────────ttl────▶ expired ──────approve────────┘
/// ```
///
/// Approval is an operator decision and is accepted from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for the buyer to pay and upload a proof.
    #[default]
    Pending,
    /// A payment proof was uploaded and awaits manual review.
    WaitingVerification,
    /// Payment confirmed by an operator.
    Paid,
    /// Never paid within the configured time-to-live.
    Expired,
}

impl OrderStatus {
    /// Whether a payment proof may be attached in this state.
    ///
    /// Paid and expired orders are closed; a late upload must not move them
    /// back to review.
    #[must_use]
    pub const fn accepts_proof(self) -> bool {
        matches!(self, Self::Pending | Self::WaitingVerification)
    }

    /// Whether the expiry sweep may close an order in this state.
    #[must_use]
    pub const fn is_expirable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::WaitingVerification => "waiting_verification",
            Self::Paid => "paid",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shop tier, chosen at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShopType {
    #[default]
    Basic,
    Premium,
    Distributor,
}

impl std::fmt::Display for ShopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Premium => write!(f, "premium"),
            Self::Distributor => write!(f, "distributor"),
        }
    }
}

/// Shop visibility status. Shops are created `active` and never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    #[default]
    Active,
}

impl std::fmt::Display for ShopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
        }
    }
}
