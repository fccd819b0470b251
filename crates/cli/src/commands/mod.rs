//! Command implementations.

pub mod migrate;
pub mod seed;
pub mod stats;

use mercado_storefront::config::{ConfigError, StorefrontConfig};

use crate::StorageKind;

/// Load storefront configuration, optionally forcing the storage backend.
///
/// # Errors
///
/// Returns `ConfigError` if the environment is incomplete for the chosen
/// backend.
pub fn load_config(storage: Option<StorageKind>) -> Result<StorefrontConfig, ConfigError> {
    let _ = dotenvy::dotenv();

    StorefrontConfig::from_lookup(|key| match (key, storage) {
        ("STOREFRONT_STORAGE", Some(kind)) => Some(kind.as_str().to_string()),
        _ => std::env::var(key).ok(),
    })
}
