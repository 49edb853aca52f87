//! Users, shops and items: creation, lookups and the ensure-default helpers.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use tracing::instrument;

use slh_shop_core::models::{CreateItem, CreateShop, Item, Order, Shop, SyncUser, User};
use slh_shop_core::{ItemId, ShopId, ShopType, UserId};

use super::ServiceError;
use crate::db::{NewItem, NewShop, RepositoryError, Store, UserProfile};

/// Attempts at allocating a unique slug and referral code.
const MAX_SHOP_INSERT_ATTEMPTS: usize = 3;

const MAX_SLUG_BASE_LEN: usize = 24;
const SLUG_SUFFIX_LEN: usize = 6;
const REFERRAL_CODE_LEN: usize = 8;

/// Title of the shop created by `ensure_default_shop`.
pub const DEFAULT_SHOP_TITLE: &str = "Sela Shop";
const DEFAULT_SHOP_DESCRIPTION: &str = "Created automatically from the bot";

/// Name of the item created by `ensure_default_item`.
pub const DEFAULT_ITEM_NAME: &str = "Love Card 39 NIS";
const DEFAULT_ITEM_DESCRIPTION: &str = "Demo card created from the bot";

/// Create and read users, shops and items.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn Store>,
}

impl Directory {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert or refresh a user keyed by Telegram id.
    ///
    /// Blank strings count as "not supplied" and never overwrite stored
    /// values. A referral code that resolves to a shop sets the referrer of a
    /// newly created user to the shop owner; unknown codes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self, payload), fields(telegram_id = payload.telegram_id))]
    pub async fn sync_user(&self, payload: &SyncUser) -> Result<User, ServiceError> {
        let referrer_id = match non_blank(payload.referral_code.as_deref()) {
            Some(code) => self.resolve_referrer(&code, payload.telegram_id).await?,
            None => None,
        };

        let profile = UserProfile {
            telegram_id: payload.telegram_id,
            telegram_username: non_blank(payload.telegram_username.as_deref()),
            display_name: non_blank(payload.display_name.as_deref()),
            referrer_id,
        };

        let user = self.store.upsert_user(&profile).await?;
        tracing::debug!(user_id = %user.id, "User synced");
        Ok(user)
    }

    async fn resolve_referrer(
        &self,
        code: &str,
        telegram_id: i64,
    ) -> Result<Option<UserId>, ServiceError> {
        let Some(shop) = self.store.get_shop_by_referral(code).await? else {
            tracing::debug!(referral_code = code, "Unknown referral code ignored");
            return Ok(None);
        };
        let owner = self.store.get_user(shop.owner_user_id).await?;
        Ok(owner
            .filter(|owner| owner.telegram_id != telegram_id)
            .map(|owner| owner.id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    pub async fn user(&self, id: UserId) -> Result<User, ServiceError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    pub async fn shops_of(&self, owner: UserId) -> Result<Vec<Shop>, ServiceError> {
        self.user(owner).await?;
        Ok(self.store.list_shops_by_owner(owner).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    pub async fn orders_of(&self, buyer: UserId) -> Result<Vec<Order>, ServiceError> {
        self.user(buyer).await?;
        Ok(self.store.list_orders_by_buyer(buyer).await?)
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Create a shop with a generated slug and referral code.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a blank title,
    /// `ServiceError::NotFound` if the owner does not exist and
    /// `ServiceError::Conflict` if no unique slug/referral code could be
    /// allocated.
    #[instrument(skip(self, request), fields(owner_user_id = %request.owner_user_id))]
    pub async fn create_shop(&self, request: &CreateShop) -> Result<Shop, ServiceError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidInput(
                "shop title must not be empty".to_string(),
            ));
        }
        self.store
            .get_user(request.owner_user_id)
            .await?
            .ok_or(ServiceError::NotFound("owner"))?;

        let mut last_conflict = String::new();
        for attempt in 1..=MAX_SHOP_INSERT_ATTEMPTS {
            let new_shop = NewShop {
                owner_user_id: request.owner_user_id,
                title: title.to_string(),
                description: non_blank(request.description.as_deref()),
                slug: generate_slug(title),
                shop_type: request.shop_type,
                referral_code: generate_referral_code(),
            };

            match self.store.insert_shop(&new_shop).await {
                Ok(shop) => {
                    tracing::info!(shop_id = %shop.id, slug = %shop.slug, "Shop created");
                    return Ok(shop);
                }
                Err(RepositoryError::Conflict(message)) => {
                    tracing::warn!(attempt, %message, "Shop identifier collision, retrying");
                    last_conflict = message;
                }
                Err(RepositoryError::NotFound) => return Err(ServiceError::NotFound("owner")),
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(last_conflict))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the shop does not exist.
    pub async fn shop(&self, id: ShopId) -> Result<Shop, ServiceError> {
        self.store
            .get_shop(id)
            .await?
            .ok_or(ServiceError::NotFound("shop"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no shop has this referral code.
    pub async fn shop_by_referral(&self, code: &str) -> Result<Shop, ServiceError> {
        self.store
            .get_shop_by_referral(code.trim())
            .await?
            .ok_or(ServiceError::NotFound("shop"))
    }

    /// Return the owner's oldest shop, creating a default one if they have none.
    ///
    /// Two concurrent calls for an owner without shops may both create one;
    /// later calls keep returning the oldest.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner does not exist.
    #[instrument(skip(self))]
    pub async fn ensure_default_shop(&self, owner: UserId) -> Result<Shop, ServiceError> {
        if let Some(shop) = self.shops_of(owner).await?.into_iter().next() {
            return Ok(shop);
        }

        self.create_shop(&CreateShop {
            owner_user_id: owner,
            title: DEFAULT_SHOP_TITLE.to_string(),
            description: Some(DEFAULT_SHOP_DESCRIPTION.to_string()),
            shop_type: ShopType::Basic,
        })
        .await
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a blank name or a
    /// non-positive price, `ServiceError::NotFound` if the shop does not
    /// exist.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        shop_id: ShopId,
        request: &CreateItem,
    ) -> Result<Item, ServiceError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "item name must not be empty".to_string(),
            ));
        }
        validate_price("price_slh", request.price_slh)?;
        validate_price("price_bnb", request.price_bnb)?;
        validate_price("price_nis", request.price_nis)?;

        self.shop(shop_id).await?;

        let item = self
            .store
            .insert_item(&NewItem {
                shop_id,
                name: name.to_string(),
                description: non_blank(request.description.as_deref()),
                image_url: non_blank(request.image_url.as_deref()),
                price_slh: request.price_slh,
                price_bnb: request.price_bnb,
                price_nis: request.price_nis,
                metadata: serde_json::Value::Object(request.metadata.clone()),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("shop"),
                other => other.into(),
            })?;

        tracing::info!(item_id = %item.id, "Item created");
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the item does not exist.
    pub async fn item(&self, id: ItemId) -> Result<Item, ServiceError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(ServiceError::NotFound("item"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the shop does not exist.
    pub async fn items_of(&self, shop: ShopId) -> Result<Vec<Item>, ServiceError> {
        self.shop(shop).await?;
        Ok(self.store.list_items_by_shop(shop).await?)
    }

    /// Return the shop's oldest item, creating the demo card if it has none.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the shop does not exist.
    #[instrument(skip(self))]
    pub async fn ensure_default_item(&self, shop: ShopId) -> Result<Item, ServiceError> {
        if let Some(item) = self.items_of(shop).await?.into_iter().next() {
            return Ok(item);
        }

        self.create_item(shop, &default_item()).await
    }
}

/// The demo card every shop gets on first use.
#[must_use]
pub fn default_item() -> CreateItem {
    let mut metadata = serde_json::Map::new();
    metadata.insert("rarity".to_string(), serde_json::json!("common"));
    metadata.insert("level".to_string(), serde_json::json!(1));

    CreateItem {
        name: DEFAULT_ITEM_NAME.to_string(),
        description: Some(DEFAULT_ITEM_DESCRIPTION.to_string()),
        image_url: None,
        price_slh: Some(Decimal::new(390, 1)),
        price_bnb: None,
        price_nis: Some(Decimal::from(39)),
        metadata,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn validate_price(field: &str, price: Option<Decimal>) -> Result<(), ServiceError> {
    match price {
        Some(p) if p <= Decimal::ZERO => Err(ServiceError::InvalidInput(format!(
            "{field} must be greater than zero"
        ))),
        _ => Ok(()),
    }
}

/// Lowercase ASCII words joined by `-`, capped in length.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(MAX_SLUG_BASE_LEN);
    for c in title.chars() {
        if slug.len() >= MAX_SLUG_BASE_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "shop".to_string()
    } else {
        slug.to_string()
    }
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn generate_slug(title: &str) -> String {
    let suffix = random_alphanumeric(SLUG_SUFFIX_LEN).to_ascii_lowercase();
    format!("{}-{suffix}", slugify(title))
}

fn generate_referral_code() -> String {
    random_alphanumeric(REFERRAL_CODE_LEN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::ErrorKind;

    fn directory() -> Directory {
        Directory::new(Arc::new(MemoryStore::new()))
    }

    fn sync(telegram_id: i64, name: Option<&str>) -> SyncUser {
        SyncUser {
            telegram_id,
            display_name: name.map(String::from),
            ..SyncUser::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Great Shop!"), "my-great-shop");
        assert_eq!(slugify("  --Hello__World--  "), "hello-world");
        assert_eq!(slugify("חנות"), "shop");
        assert_eq!(slugify(""), "shop");
        assert_eq!(
            slugify("abcdefghijklmnopqrstuvwxyz0123"),
            "abcdefghijklmnopqrstuvwx"
        );
        assert_eq!(slugify("Sela Shop של המשתמש"), "sela-shop");
    }

    #[test]
    fn test_generated_identifiers() {
        let slug = generate_slug("Sela Shop");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "sela-shop");
        assert_eq!(suffix.len(), SLUG_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );

        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_sync_user_twice_keeps_one_row_with_latest_name() {
        let dir = directory();
        let first = dir.sync_user(&sync(42, Some("Ava"))).await.unwrap();
        let second = dir.sync_user(&sync(42, Some("Ava Cohen"))).await.unwrap();
        let third = dir.sync_user(&sync(42, Some("   "))).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.id, third.id);
        assert_eq!(third.display_name.as_deref(), Some("Ava Cohen"));
    }

    #[tokio::test]
    async fn test_referral_code_sets_referrer_on_insert_only() {
        let dir = directory();
        let owner = dir.sync_user(&sync(1, Some("Owner"))).await.unwrap();
        let shop = dir.ensure_default_shop(owner.id).await.unwrap();

        let mut payload = sync(2, Some("Guest"));
        payload.referral_code = Some(shop.referral_code.clone());
        let guest = dir.sync_user(&payload).await.unwrap();
        assert_eq!(guest.referrer_id, Some(owner.id));

        // The owner following their own link is not their own referrer.
        let mut own = sync(1, None);
        own.referral_code = Some(shop.referral_code.clone());
        let owner = dir.sync_user(&own).await.unwrap();
        assert!(owner.referrer_id.is_none());

        let mut unknown = sync(3, None);
        unknown.referral_code = Some("nope".to_string());
        let stranger = dir.sync_user(&unknown).await.unwrap();
        assert!(stranger.referrer_id.is_none());
    }

    #[tokio::test]
    async fn test_create_shop_requires_owner() {
        let dir = directory();
        let err = dir
            .create_shop(&CreateShop {
                owner_user_id: UserId::generate(),
                title: "Shop".to_string(),
                description: None,
                shop_type: ShopType::Premium,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_shop_generates_unique_identifiers() {
        let dir = directory();
        let owner = dir.sync_user(&sync(5, None)).await.unwrap();
        let request = CreateShop {
            owner_user_id: owner.id,
            title: "Twin".to_string(),
            description: None,
            shop_type: ShopType::Distributor,
        };
        let a = dir.create_shop(&request).await.unwrap();
        let b = dir.create_shop(&request).await.unwrap();

        assert_ne!(a.slug, b.slug);
        assert_ne!(a.referral_code, b.referral_code);
        assert_eq!(a.shop_type, ShopType::Distributor);
        assert_eq!(dir.shops_of(owner.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ensure_defaults_are_stable() {
        let dir = directory();
        let owner = dir.sync_user(&sync(9, None)).await.unwrap();

        let shop = dir.ensure_default_shop(owner.id).await.unwrap();
        assert_eq!(shop.title, DEFAULT_SHOP_TITLE);
        assert_eq!(dir.ensure_default_shop(owner.id).await.unwrap().id, shop.id);

        let item = dir.ensure_default_item(shop.id).await.unwrap();
        assert_eq!(item.name, DEFAULT_ITEM_NAME);
        assert_eq!(item.price_slh.unwrap().to_string(), "39.0");
        assert_eq!(item.price_nis.unwrap().to_string(), "39");
        assert!(item.price_bnb.is_none());
        assert_eq!(
            item.metadata,
            serde_json::json!({"rarity": "common", "level": 1})
        );
        assert_eq!(dir.ensure_default_item(shop.id).await.unwrap().id, item.id);
    }

    #[tokio::test]
    async fn test_create_item_validation() {
        let dir = directory();
        let owner = dir.sync_user(&sync(11, None)).await.unwrap();
        let shop = dir.ensure_default_shop(owner.id).await.unwrap();

        let blank = CreateItem {
            name: "  ".to_string(),
            ..CreateItem::default()
        };
        let err = dir.create_item(shop.id, &blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let free = CreateItem {
            name: "Free".to_string(),
            price_slh: Some(Decimal::ZERO),
            ..CreateItem::default()
        };
        let err = dir.create_item(shop.id, &free).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = dir
            .create_item(ShopId::generate(), &default_item())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
