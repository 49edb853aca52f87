//! Command and photo handlers.
//!
//! Handlers turn one incoming message into API calls and return the reply
//! text. They never talk to Telegram, so they can be driven directly in
//! tests against an in-process API.

use tracing::{error, info, instrument};

use slh_shop_core::PaymentMethod;
use slh_shop_core::models::{CreateOrder, SyncUser, User};

use crate::api_client::{ApiClientError, ProofFor, ShopApiClient};
use crate::commands::Command;
use crate::conversation::Conversations;
use crate::messages::{self, Failure, Locale};
use crate::telegram;

/// The Telegram user a message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: String,
}

impl From<&telegram::User> for Sender {
    fn from(user: &telegram::User) -> Self {
        Self {
            telegram_id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
        }
    }
}

/// Handles bot commands and proof photos.
#[derive(Debug, Clone)]
pub struct Handler {
    api: ShopApiClient,
    conversations: Conversations,
    locale: Locale,
    bot_username: String,
}

impl Handler {
    #[must_use]
    pub fn new(
        api: ShopApiClient,
        conversations: Conversations,
        locale: Locale,
        bot_username: impl Into<String>,
    ) -> Self {
        Self {
            api,
            conversations,
            locale,
            bot_username: bot_username.into(),
        }
    }

    #[must_use]
    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    #[must_use]
    pub const fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    /// Run a command and return the reply.
    #[instrument(skip(self, sender), fields(telegram_id = sender.telegram_id))]
    pub async fn on_command(&self, sender: &Sender, command: Command) -> String {
        match command {
            Command::Start { referral_code } => self.start(sender, referral_code).await,
            Command::MyShop => self.my_shop(sender).await,
            Command::DemoOrder => self.demo_order(sender).await,
            Command::Unknown(_) => messages::unknown_command(self.locale),
        }
    }

    async fn start(&self, sender: &Sender, referral_code: Option<String>) -> String {
        let user = match self.sync_user(sender, referral_code.clone()).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "Failed to sync user");
                return messages::failure(self.locale, Failure::Sync);
            }
        };

        if let Some(code) = referral_code {
            return self.shop_view(&code).await;
        }

        let name = user
            .display_name
            .as_deref()
            .unwrap_or(sender.full_name.as_str());
        messages::welcome(self.locale, name)
    }

    async fn shop_view(&self, code: &str) -> String {
        let loaded = async {
            let shop = self.api.shop_by_referral(code).await?;
            let items = self.api.shop_items(shop.id).await?;
            Ok::<_, ApiClientError>((shop, items))
        }
        .await;

        match loaded {
            Ok((shop, items)) => messages::shop_view(self.locale, &shop, &items),
            Err(e) => {
                info!(error = %e, referral_code = code, "Shop lookup failed");
                messages::failure(self.locale, Failure::ShopNotFound)
            }
        }
    }

    async fn my_shop(&self, sender: &Sender) -> String {
        let ensured = async {
            let user = self.user_for(sender).await?;
            let shop = self.api.default_shop(user.id).await?;
            self.api.default_item(shop.id).await?;
            Ok::<_, ApiClientError>(shop)
        }
        .await;

        match ensured {
            Ok(shop) => {
                let link = messages::deep_link(&self.bot_username, &shop.referral_code);
                messages::my_shop(self.locale, &shop, &link)
            }
            Err(e) => {
                error!(error = %e, "Failed to load or create shop");
                messages::failure(self.locale, Failure::MyShop)
            }
        }
    }

    async fn demo_order(&self, sender: &Sender) -> String {
        let created = async {
            let user = self.user_for(sender).await?;
            let shop = self.api.default_shop(user.id).await?;
            let item = self.api.default_item(shop.id).await?;
            let order = CreateOrder {
                buyer_user_id: user.id,
                shop_id: shop.id,
                item_id: item.id,
                payment_method: PaymentMethod::Slh,
            };
            let created = self.api.create_order(&order).await?;
            Ok::<_, ApiClientError>((item, created))
        }
        .await;

        match created {
            Ok((item, created)) => {
                self.conversations
                    .remember_order(sender.telegram_id, created.order.id)
                    .await;
                info!(order_id = %created.order.id, "Demo order created");
                messages::demo_order(self.locale, &item, &created)
            }
            Err(e) => {
                error!(error = %e, "Failed to create demo order");
                messages::failure(self.locale, Failure::DemoOrder)
            }
        }
    }

    /// Attach a photo to the chat's order and return the reply.
    ///
    /// The order created earlier in this chat is named explicitly; without
    /// one the API falls back to the buyer's most recent order.
    #[instrument(skip(self, sender, bytes), fields(telegram_id = sender.telegram_id, size = bytes.len()))]
    pub async fn on_photo(&self, sender: &Sender, bytes: Vec<u8>, filename: &str) -> String {
        let user = match self.user_for(sender).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "Failed to sync user for proof upload");
                return messages::failure(self.locale, Failure::Proof);
            }
        };

        let remembered = self.conversations.get(sender.telegram_id).await.last_order_id;
        let target = remembered.map_or(ProofFor::LatestOf(user.id), ProofFor::Order);

        match self.api.upload_proof(target, bytes, filename).await {
            Ok(receipt) => {
                info!(
                    order_id = %receipt.order_id,
                    resolved_by = ?receipt.resolved_by,
                    "Payment proof attached"
                );
                messages::proof_received(self.locale, &receipt)
            }
            Err(e) => match e.code() {
                Some("not_found") => {
                    self.conversations.forget_order(sender.telegram_id).await;
                    messages::failure(self.locale, Failure::NoOrder)
                }
                Some("invalid_input" | "conflict") => {
                    self.conversations.forget_order(sender.telegram_id).await;
                    messages::proof_rejected(self.locale, remembered)
                }
                _ => {
                    error!(error = %e, "Failed to upload payment proof");
                    messages::failure(self.locale, Failure::Proof)
                }
            },
        }
    }

    /// Reply for a photo that could not be fetched from Telegram.
    #[must_use]
    pub fn on_photo_unavailable(&self) -> String {
        messages::failure(self.locale, Failure::Proof)
    }

    /// The remembered user for this chat, synced on first use.
    async fn user_for(&self, sender: &Sender) -> Result<User, ApiClientError> {
        if let Some(user) = self.conversations.get(sender.telegram_id).await.user {
            return Ok(user);
        }
        self.sync_user(sender, None).await
    }

    async fn sync_user(
        &self,
        sender: &Sender,
        referral_code: Option<String>,
    ) -> Result<User, ApiClientError> {
        let request = SyncUser {
            telegram_id: sender.telegram_id,
            telegram_username: sender.username.clone(),
            display_name: Some(sender.full_name.clone()),
            referral_code,
        };
        let user = self.api.sync_user(&request).await?;
        self.conversations
            .remember_user(sender.telegram_id, user.clone())
            .await;
        Ok(user)
    }
}

/// File name to upload a Telegram photo under.
#[must_use]
pub fn proof_filename(file_path: Option<&str>) -> String {
    file_path
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("proof.jpg")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_filename() {
        assert_eq!(proof_filename(Some("photos/file_12.jpg")), "file_12.jpg");
        assert_eq!(proof_filename(Some("file_3.png")), "file_3.png");
        assert_eq!(proof_filename(Some("photos/")), "proof.jpg");
        assert_eq!(proof_filename(None), "proof.jpg");
    }

    #[test]
    fn test_sender_from_telegram_user() {
        let user = telegram::User {
            id: 42,
            is_bot: false,
            first_name: "Ava".to_string(),
            last_name: None,
            username: Some("ava".to_string()),
        };
        let sender = Sender::from(&user);
        assert_eq!(sender.telegram_id, 42);
        assert_eq!(sender.full_name, "Ava");
        assert_eq!(sender.username.as_deref(), Some("ava"));
    }
}
