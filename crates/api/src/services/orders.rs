//! Order lifecycle: creation, payment proofs, approval and expiry.
//!
//! ```text
//! create ─▶ pending ─proof─▶ waiting_verification ─approve─▶ paid
//!              └──ttl──▶ expired
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tracing::instrument;

use slh_shop_core::models::{CreateOrder, Order, OrderWithPayment, ProofReceipt, ProofTarget};
use slh_shop_core::{OrderId, PaymentMethod, UserId};

use super::ServiceError;
use super::proofs::ProofStore;
use crate::config::{OrderPolicy, PaymentConfig};
use crate::db::{NewOrder, Store};

/// Which order a proof upload is meant for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProofRequest {
    /// Takes precedence when present.
    pub order_id: Option<OrderId>,
    /// Fallback: the buyer's most recently created order.
    pub buyer_user_id: Option<UserId>,
}

/// Drives orders through their states.
#[derive(Clone)]
pub struct OrderLifecycle {
    store: Arc<dyn Store>,
    payment: PaymentConfig,
    proofs: ProofStore,
}

impl OrderLifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, payment: PaymentConfig, proofs: ProofStore) -> Self {
        Self {
            store,
            payment,
            proofs,
        }
    }

    /// Create a `pending` order priced from the item and return the static
    /// payment instructions for it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the buyer, shop or item does not
    /// exist, and `ServiceError::InvalidInput` if the item belongs to another
    /// shop or has no price in the requested currency.
    #[instrument(
        skip(self, request),
        fields(
            buyer_user_id = %request.buyer_user_id,
            item_id = %request.item_id,
            payment_method = %request.payment_method,
        )
    )]
    pub async fn create(&self, request: &CreateOrder) -> Result<OrderWithPayment, ServiceError> {
        self.store
            .get_user(request.buyer_user_id)
            .await?
            .ok_or(ServiceError::NotFound("buyer"))?;
        self.store
            .get_shop(request.shop_id)
            .await?
            .ok_or(ServiceError::NotFound("shop"))?;
        let item = self
            .store
            .get_item(request.item_id)
            .await?
            .ok_or(ServiceError::NotFound("item"))?;

        if item.shop_id != request.shop_id {
            return Err(ServiceError::InvalidInput(
                "item does not belong to this shop".to_string(),
            ));
        }

        let method = request.payment_method;
        let amount = item.price_for(method).ok_or_else(|| {
            ServiceError::InvalidInput(format!("item has no {} price", method.symbol()))
        })?;

        let (amount_slh, amount_bnb) = match method {
            PaymentMethod::Slh => (Some(amount), None),
            PaymentMethod::Bnb => (None, Some(amount)),
        };

        let order = self
            .store
            .insert_order(&NewOrder {
                buyer_user_id: request.buyer_user_id,
                shop_id: request.shop_id,
                item_id: request.item_id,
                amount_slh,
                amount_bnb,
            })
            .await?;

        tracing::info!(order_id = %order.id, %amount, "Order created");

        Ok(OrderWithPayment {
            payment_instructions: self.payment.instructions(method, amount),
            order,
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    pub async fn order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .get_order(id)
            .await?
            .ok_or(ServiceError::NotFound("order"))
    }

    /// Store a payment proof and move the order to `waiting_verification`.
    ///
    /// The stored file is removed again if the order cannot be updated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for an empty payload, a missing
    /// target or a closed order, `ServiceError::NotFound` if no order
    /// resolves, and a storage error if the file or row cannot be written.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn submit_proof(
        &self,
        target: ProofRequest,
        bytes: &[u8],
        filename: Option<&str>,
    ) -> Result<ProofReceipt, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidInput(
                "proof file is empty".to_string(),
            ));
        }

        let (order, resolved_by) = self.resolve_proof_target(target).await?;
        ensure_accepts_proof(&order)?;

        let stored = self.proofs.save(bytes, filename).await?;

        let updated = match self.store.attach_proof(order.id, &stored.url).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.proofs.discard(&stored).await;
                // The order changed between the check and the update.
                let current = self.order(order.id).await?;
                ensure_accepts_proof(&current)?;
                return Err(ServiceError::Conflict(
                    "order changed while the proof was stored".to_string(),
                ));
            }
            Err(e) => {
                self.proofs.discard(&stored).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            order_id = %updated.id,
            resolved_by = ?resolved_by,
            proof = %stored.url,
            "Payment proof attached"
        );

        Ok(ProofReceipt {
            order_id: updated.id,
            resolved_by,
            status: updated.status,
            payment_proof_url: stored.url,
        })
    }

    async fn resolve_proof_target(
        &self,
        target: ProofRequest,
    ) -> Result<(Order, ProofTarget), ServiceError> {
        if let Some(id) = target.order_id {
            return Ok((self.order(id).await?, ProofTarget::Explicit));
        }

        let Some(buyer) = target.buyer_user_id else {
            return Err(ServiceError::InvalidInput(
                "order_id or buyer_user_id is required".to_string(),
            ));
        };

        let order = self
            .store
            .latest_order_for_buyer(buyer)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;
        Ok((order, ProofTarget::LatestForBuyer))
    }

    /// Mark an order `paid`, whatever its current status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: OrderId) -> Result<Order, ServiceError> {
        let order = self
            .store
            .mark_paid(id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;
        tracing::info!(order_id = %order.id, "Order approved");
        Ok(order)
    }

    /// Expire `pending` orders older than `ttl`. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if `ttl` is out of range, or a
    /// storage error.
    pub async fn expire_stale(&self, ttl: Duration) -> Result<u64, ServiceError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|_| ServiceError::InvalidInput("ttl is out of range".to_string()))?;
        self.expire_created_before(Utc::now() - ttl).await
    }

    /// Expire `pending` orders created before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    #[instrument(skip(self))]
    pub async fn expire_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        let expired = self.store.expire_pending_orders(cutoff).await?;
        if expired > 0 {
            tracing::info!(expired, "Expired stale pending orders");
        }
        Ok(expired)
    }
}

fn ensure_accepts_proof(order: &Order) -> Result<(), ServiceError> {
    if order.status.accepts_proof() {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!(
            "order is {} and no longer accepts payment proofs",
            order.status
        )))
    }
}

/// Run the expiry sweep every `policy.sweep_interval` until the task is aborted.
pub fn spawn_expiry_sweeper(lifecycle: OrderLifecycle, policy: OrderPolicy) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = lifecycle.expire_stale(policy.ttl).await {
                tracing::error!(error = %e, "Order expiry sweep failed");
            }
        }
    })
}
