//! In-memory implementation of [`Store`].
//!
//! Mirrors the Postgres constraints (unique keys, foreign keys, guarded
//! status updates) so services behave identically against either backend.
//! Data is lost when the process exits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use slh_shop_core::models::{Item, Order, Shop, User};
use slh_shop_core::{ItemId, OrderId, OrderStatus, ShopId, ShopStatus, UserId};

use super::{NewItem, NewOrder, NewShop, RepositoryError, Store, UserProfile};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    shops: Vec<Shop>,
    items: Vec<Item>,
    orders: Vec<Order>,
}

/// Store that keeps every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.telegram_id == profile.telegram_id)
        {
            if let Some(username) = &profile.telegram_username {
                user.telegram_username = Some(username.clone());
            }
            if let Some(name) = &profile.display_name {
                user.display_name = Some(name.clone());
            }
            user.updated_at = now;
            return Ok(user.clone());
        }

        if let Some(referrer) = profile.referrer_id
            && !tables.users.iter().any(|u| u.id == referrer)
        {
            return Err(RepositoryError::NotFound);
        }

        let user = User {
            id: UserId::generate(),
            telegram_id: profile.telegram_id,
            telegram_username: profile.telegram_username.clone(),
            display_name: profile.display_name.clone(),
            bnb_address: None,
            ton_address: None,
            referrer_id: profile.referrer_id,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == shop.owner_user_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.shops.iter().any(|s| s.slug == shop.slug) {
            return Err(RepositoryError::Conflict(format!(
                "slug {} already exists",
                shop.slug
            )));
        }
        if tables
            .shops
            .iter()
            .any(|s| s.referral_code == shop.referral_code)
        {
            return Err(RepositoryError::Conflict(
                "referral code already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let shop = Shop {
            id: ShopId::generate(),
            owner_user_id: shop.owner_user_id,
            title: shop.title.clone(),
            description: shop.description.clone(),
            slug: shop.slug.clone(),
            shop_type: shop.shop_type,
            status: ShopStatus::Active,
            referral_code: shop.referral_code.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.shops.push(shop.clone());
        Ok(shop)
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.shops.iter().find(|s| s.id == id).cloned())
    }

    async fn get_shop_by_referral(&self, code: &str) -> Result<Option<Shop>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shops
            .iter()
            .find(|s| s.referral_code == code)
            .cloned())
    }

    async fn list_shops_by_owner(&self, owner: UserId) -> Result<Vec<Shop>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shops
            .iter()
            .filter(|s| s.owner_user_id == owner)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.shops.iter().any(|s| s.id == item.shop_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let item = Item {
            id: ItemId::generate(),
            shop_id: item.shop_id,
            name: item.name.clone(),
            description: item.description.clone(),
            image_url: item.image_url.clone(),
            price_slh: item.price_slh,
            price_bnb: item.price_bnb,
            price_nis: item.price_nis,
            metadata: item.metadata.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.items.iter().find(|i| i.id == id).cloned())
    }

    async fn list_items_by_shop(&self, shop: ShopId) -> Result<Vec<Item>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|i| i.shop_id == shop)
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;

        let references_exist = tables.users.iter().any(|u| u.id == order.buyer_user_id)
            && tables.shops.iter().any(|s| s.id == order.shop_id)
            && tables.items.iter().any(|i| i.id == order.item_id);
        if !references_exist {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            buyer_user_id: order.buyer_user_id,
            shop_id: order.shop_id,
            item_id: order.item_id,
            amount_slh: order.amount_slh,
            amount_bnb: order.amount_bnb,
            status: OrderStatus::Pending,
            tx_hash: None,
            payment_proof_url: None,
            created_at: now,
            updated_at: now,
        };
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn latest_order_for_buyer(
        &self,
        buyer: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.buyer_user_id == buyer)
            .max_by_key(|o| (o.created_at, o.id.as_uuid()))
            .cloned())
    }

    async fn list_orders_by_buyer(&self, buyer: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.buyer_user_id == buyer)
            .cloned()
            .collect())
    }

    async fn attach_proof(
        &self,
        id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status.accepts_proof())
        else {
            return Ok(None);
        };

        order.payment_proof_url = Some(proof_url.to_string());
        order.status = OrderStatus::WaitingVerification;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn mark_paid(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };

        order.status = OrderStatus::Paid;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn expire_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut expired = 0;

        for order in tables
            .orders
            .iter_mut()
            .filter(|o| o.status.is_expirable() && o.created_at < cutoff)
        {
            order.status = OrderStatus::Expired;
            order.updated_at = now;
            expired += 1;
        }

        Ok(expired)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
