//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Storage;
use crate::realtime::RealtimeHub;
use crate::services::{Carts, Catalog};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the services, the realtime hub, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    carts: Carts,
    hub: Arc<RealtimeHub>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storage` - Product and cart repositories
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: Storage) -> Self {
        let hub = Arc::new(RealtimeHub::new());
        let catalog = Catalog::new(Arc::clone(&storage.products), Arc::clone(&hub));
        let carts = Carts::new(storage.carts, storage.products);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
                hub,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Product operations.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Cart operations.
    #[must_use]
    pub fn carts(&self) -> &Carts {
        &self.inner.carts
    }

    /// Realtime event hub.
    #[must_use]
    pub fn hub(&self) -> &RealtimeHub {
        &self.inner.hub
    }
}
