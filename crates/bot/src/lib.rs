//! SLH Shop Telegram bot library.
//!
//! Translates Telegram messages into calls against the shop API:
//!
//! - `/start [shop_<code>]` registers the user and optionally opens a shop
//! - `/myshop` shows (and creates on first use) the user's shop and deep link
//! - `/demo_order` creates a test order and shows payment instructions
//! - a photo is uploaded as the payment proof of the chat's order
//!
//! # Modules
//!
//! - [`telegram`] - Bot API client and wire types
//! - [`api_client`] - Shop API client
//! - [`handlers`] - Per-message logic, independent of Telegram I/O
//! - [`poller`] - `getUpdates` loop

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api_client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod handlers;
pub mod messages;
pub mod poller;
pub mod telegram;
