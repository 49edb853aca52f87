//! Business logic for the shop API.
//!
//! # Services
//!
//! - `directory` - Users, shops and items
//! - `orders` - Order lifecycle and payment proofs
//! - `proofs` - Content store for proof files

mod error;

pub mod directory;
pub mod orders;
pub mod proofs;

pub use directory::Directory;
pub use error::{ErrorKind, ServiceError};
pub use orders::{OrderLifecycle, ProofRequest};
pub use proofs::ProofStore;
