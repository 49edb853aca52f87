//! Telegram Bot API integration.
//!
//! This module provides:
//! - [`TelegramClient`] for long polling, sending replies and downloading files
//! - Wire types for the subset of the Bot API the bot uses
//!
//! # Flow
//!
//! 1. `getUpdates` long-polls for new messages
//! 2. Commands and photos are handed to the handler
//! 3. Photos are fetched via `getFile` + the file download endpoint
//! 4. Replies go out with `sendMessage`

mod client;
mod error;
mod types;

pub use client::{TELEGRAM_API_BASE, TelegramClient};
pub use error::TelegramError;
pub use types::{Chat, File, Message, PhotoSize, Update, User};
