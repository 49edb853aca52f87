//! `PostgreSQL` implementation of [`Store`].
//!
//! Queries are runtime-checked (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slh_shop_core::models::{Item, Order, Shop, User};
use slh_shop_core::{ItemId, OrderId, ShopId, UserId};

use super::{NewItem, NewOrder, NewShop, RepositoryError, Store, UserProfile};

/// Store backed by a `PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate constraint violations into repository errors.
fn map_write_error(e: sqlx::Error, entity: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!(
                "{entity} violates unique constraint {}",
                db_err.constraint().unwrap_or("unknown")
            ));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<User, RepositoryError> {
        // Single statement: the unique index on telegram_id serializes
        // concurrent first contacts, and COALESCE keeps stored values when
        // the caller supplied nothing new.
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (id, telegram_id, telegram_username, display_name, referrer_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (telegram_id) DO UPDATE SET
                telegram_username = COALESCE(EXCLUDED.telegram_username, users.telegram_username),
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                updated_at = NOW()
            RETURNING id, telegram_id, telegram_username, display_name,
                      bnb_address, ton_address, referrer_id, created_at, updated_at
            ",
        )
        .bind(UserId::generate())
        .bind(profile.telegram_id)
        .bind(profile.telegram_username.as_deref())
        .bind(profile.display_name.as_deref())
        .bind(profile.referrer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, telegram_id, telegram_username, display_name,
                   bnb_address, ton_address, referrer_id, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError> {
        let shop = sqlx::query_as::<_, Shop>(
            r"
            INSERT INTO shops (id, owner_user_id, title, description, slug, shop_type, referral_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_user_id, title, description, slug, shop_type, status,
                      referral_code, created_at, updated_at
            ",
        )
        .bind(ShopId::generate())
        .bind(shop.owner_user_id)
        .bind(&shop.title)
        .bind(shop.description.as_deref())
        .bind(&shop.slug)
        .bind(shop.shop_type)
        .bind(&shop.referral_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "shop"))?;

        Ok(shop)
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        let shop = sqlx::query_as::<_, Shop>(
            r"
            SELECT id, owner_user_id, title, description, slug, shop_type, status,
                   referral_code, created_at, updated_at
            FROM shops
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn get_shop_by_referral(&self, code: &str) -> Result<Option<Shop>, RepositoryError> {
        let shop = sqlx::query_as::<_, Shop>(
            r"
            SELECT id, owner_user_id, title, description, slug, shop_type, status,
                   referral_code, created_at, updated_at
            FROM shops
            WHERE referral_code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn list_shops_by_owner(&self, owner: UserId) -> Result<Vec<Shop>, RepositoryError> {
        let shops = sqlx::query_as::<_, Shop>(
            r"
            SELECT id, owner_user_id, title, description, slug, shop_type, status,
                   referral_code, created_at, updated_at
            FROM shops
            WHERE owner_user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(shops)
    }

    async fn insert_item(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let item = sqlx::query_as::<_, Item>(
            r"
            INSERT INTO items (id, shop_id, name, description, image_url,
                               price_slh, price_bnb, price_nis, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, shop_id, name, description, image_url,
                      price_slh, price_bnb, price_nis, metadata, created_at, updated_at
            ",
        )
        .bind(ItemId::generate())
        .bind(item.shop_id)
        .bind(&item.name)
        .bind(item.description.as_deref())
        .bind(item.image_url.as_deref())
        .bind(item.price_slh)
        .bind(item.price_bnb)
        .bind(item.price_nis)
        .bind(&item.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "item"))?;

        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let item = sqlx::query_as::<_, Item>(
            r"
            SELECT id, shop_id, name, description, image_url,
                   price_slh, price_bnb, price_nis, metadata, created_at, updated_at
            FROM items
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list_items_by_shop(&self, shop: ShopId) -> Result<Vec<Item>, RepositoryError> {
        let items = sqlx::query_as::<_, Item>(
            r"
            SELECT id, shop_id, name, description, image_url,
                   price_slh, price_bnb, price_nis, metadata, created_at, updated_at
            FROM items
            WHERE shop_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(shop)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                      status, tx_hash, payment_proof_url, created_at, updated_at
            ",
        )
        .bind(OrderId::generate())
        .bind(order.buyer_user_id)
        .bind(order.shop_id)
        .bind(order.item_id)
        .bind(order.amount_slh)
        .bind(order.amount_bnb)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "order"))?;

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                   status, tx_hash, payment_proof_url, created_at, updated_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn latest_order_for_buyer(
        &self,
        buyer: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                   status, tx_hash, payment_proof_url, created_at, updated_at
            FROM orders
            WHERE buyer_user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(buyer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_orders_by_buyer(&self, buyer: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                   status, tx_hash, payment_proof_url, created_at, updated_at
            FROM orders
            WHERE buyer_user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(buyer)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn attach_proof(
        &self,
        id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET payment_proof_url = $2,
                status = 'waiting_verification',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'waiting_verification')
            RETURNING id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                      status, tx_hash, payment_proof_url, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(proof_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn mark_paid(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET status = 'paid', updated_at = NOW()
            WHERE id = $1
            RETURNING id, buyer_user_id, shop_id, item_id, amount_slh, amount_bnb,
                      status, tx_hash, payment_proof_url, created_at, updated_at
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn expire_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'pending' AND created_at < $1
            ",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
