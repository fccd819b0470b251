//! Catalog statistics command.

use mercado_storefront::db::Storage;

use super::load_config;
use crate::StorageKind;

/// Print product and cart counts for the configured backend.
///
/// # Errors
///
/// Returns an error if configuration is invalid or storage cannot be read.
pub async fn show(storage: Option<StorageKind>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(storage)?;
    let store = Storage::from_config(&config.storage).await?;

    let products = store.products.count().await?;
    let carts = store.carts.count().await?;

    tracing::debug!(backend = config.storage.kind(), products, carts, "Loaded stats");

    #[allow(clippy::print_stdout)]
    {
        println!("backend:  {}", config.storage.kind());
        println!("products: {products}");
        println!("carts:    {carts}");
    }

    Ok(())
}
