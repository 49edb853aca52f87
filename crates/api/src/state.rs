//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::{Directory, OrderLifecycle, ProofStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the services built on it and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    directory: Directory,
    orders: OrderLifecycle,
}

impl AppState {
    /// Create a new application state over any store backend.
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        let proofs = ProofStore::new(config.upload_dir.clone());
        let directory = Directory::new(Arc::clone(&store));
        let orders = OrderLifecycle::new(Arc::clone(&store), config.payment.clone(), proofs);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                directory,
                orders,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the store backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Users, shops and items.
    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.inner.directory
    }

    /// Order lifecycle and payment proofs.
    #[must_use]
    pub fn orders(&self) -> &OrderLifecycle {
        &self.inner.orders
    }
}
