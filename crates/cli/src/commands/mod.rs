//! Command implementations.

pub mod migrate;
pub mod orders;
