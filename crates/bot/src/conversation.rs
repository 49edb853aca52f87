//! Per-chat conversation memory.
//!
//! Remembers the synced user record and the last order created in a chat so
//! a following photo can be attached to that order explicitly. Entries live
//! in a bounded `moka` cache and expire after a period of inactivity.

use std::time::Duration;

use moka::future::Cache;

use slh_shop_core::OrderId;
use slh_shop_core::models::User;

/// Idle time after which a conversation is forgotten.
pub const CONVERSATION_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const MAX_CONVERSATIONS: u64 = 10_000;

/// What the bot remembers about one Telegram user.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub user: Option<User>,
    pub last_order_id: Option<OrderId>,
}

/// Conversation memory keyed by Telegram user id.
#[derive(Clone)]
pub struct Conversations {
    cache: Cache<i64, Conversation>,
}

impl std::fmt::Debug for Conversations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversations")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for Conversations {
    fn default() -> Self {
        Self::new(CONVERSATION_TTL)
    }
}

impl Conversations {
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CONVERSATIONS)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }

    pub async fn get(&self, telegram_id: i64) -> Conversation {
        self.cache.get(&telegram_id).await.unwrap_or_default()
    }

    /// Store the synced user, keeping any remembered order.
    pub async fn remember_user(&self, telegram_id: i64, user: User) {
        let mut conversation = self.get(telegram_id).await;
        conversation.user = Some(user);
        self.cache.insert(telegram_id, conversation).await;
    }

    /// Store the order a following proof should be attached to.
    pub async fn remember_order(&self, telegram_id: i64, order_id: OrderId) {
        let mut conversation = self.get(telegram_id).await;
        conversation.last_order_id = Some(order_id);
        self.cache.insert(telegram_id, conversation).await;
    }

    /// Drop the remembered order once it no longer accepts a proof.
    pub async fn forget_order(&self, telegram_id: i64) {
        let mut conversation = self.get(telegram_id).await;
        if conversation.last_order_id.take().is_some() {
            self.cache.insert(telegram_id, conversation).await;
        }
    }
}
