//! Core types for SLH Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod payment;
pub mod status;

pub use id::*;
pub use payment::{PaymentInstructions, PaymentMethod};
pub use status::*;
