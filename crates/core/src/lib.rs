//! SLH Shop Core - Shared types library.
//!
//! This crate provides common types used across all SLH Shop components:
//! - `api` - REST server for users, shops, items, orders and payment proofs
//! - `bot` - Telegram front end that drives the API
//! - `cli` - Command-line tools for migrations and order operations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. The wire records in [`models`] are shared verbatim by the
//! server (which produces them) and the bot (which consumes them).
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses and payment methods
//! - [`models`] - Entity records and request payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use types::*;
