//! Catalog service.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use mercado_core::{NewProduct, Page, Product, ProductId, ProductQuery, ProductUpdate};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::realtime::{RealtimeHub, ServerEvent};

/// Product operations shared by the REST API, views, and WebSocket clients.
#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductRepository>,
    hub: Arc<RealtimeHub>,
}

fn product_not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("product {id} not found"))
}

/// Turn a repository `NotFound` into a message naming the product.
fn for_product(id: ProductId) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => product_not_found(id),
        other => AppError::Database(other),
    }
}

impl Catalog {
    /// Create a catalog over a product repository and realtime hub.
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>, hub: Arc<RealtimeHub>) -> Self {
        Self { products, hub }
    }

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>> {
        Ok(self.products.list(query).await?)
    }

    /// Every product in ID order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.products.list_all().await?)
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Validate and store a new product, then broadcast the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, or `AppError::Database`
    /// with a conflict if the code is already taken.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewProduct) -> Result<Product> {
        let draft = input.validate()?;
        let product = self.products.create(draft).await?;

        info!(product_id = %product.id, code = %product.code, "Product created");
        let product_id = product.id.to_string();
        add_breadcrumb(
            "catalog",
            "Product created",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.broadcast().await;
        Ok(product)
    }

    /// Apply a partial update, then broadcast the catalog.
    ///
    /// An update with no fields leaves the product unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound`, a validation error, or a code conflict.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: ProductId, update: ProductUpdate) -> Result<Product> {
        let product = self
            .products
            .update(id, update)
            .await
            .map_err(for_product(id))?;

        info!(product_id = %id, "Product updated");
        self.broadcast().await;
        Ok(product)
    }

    /// Delete a product, then broadcast the catalog.
    ///
    /// Carts that reference the product keep their lines; populated views
    /// skip them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no product has this ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<Product> {
        let product = self.products.delete(id).await.map_err(for_product(id))?;

        info!(product_id = %id, "Product deleted");
        let product_id = id.to_string();
        add_breadcrumb(
            "catalog",
            "Product deleted",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.broadcast().await;
        Ok(product)
    }

    /// Current catalog as a realtime event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn snapshot(&self) -> Result<ServerEvent> {
        Ok(ServerEvent::Products {
            products: self.list_all().await?,
        })
    }

    /// Number of stored products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.products.count().await?)
    }

    /// Publish a snapshot to every connected client.
    ///
    /// The mutation has already been stored, so a failed read only logs.
    async fn broadcast(&self) {
        match self.snapshot().await {
            Ok(event) => {
                self.hub.publish(event);
            }
            Err(e) => warn!(error = %e, "Failed to load products for broadcast"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::FileProductRepository;

    async fn catalog(dir: &tempfile::TempDir) -> (Catalog, Arc<RealtimeHub>) {
        let repo = FileProductRepository::open(dir.path().join("products.json"))
            .await
            .unwrap();
        let hub = Arc::new(RealtimeHub::new());
        (Catalog::new(Arc::new(repo), Arc::clone(&hub)), hub)
    }

    fn input(code: &str) -> NewProduct {
        NewProduct {
            title: Some("Alfajor".to_string()),
            description: Some("Dulce de leche".to_string()),
            code: Some(code.to_string()),
            price: Some(Decimal::new(250, 2)),
            stock: Some(12),
            category: Some("snacks".to_string()),
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_mutations_broadcast_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, hub) = catalog(&dir).await;
        let mut rx = hub.subscribe();

        let product = catalog.create(input("ALF-1")).await.unwrap();
        let ServerEvent::Products { products } = rx.recv().await.unwrap() else {
            panic!("expected products event");
        };
        assert_eq!(products, vec![product.clone()]);

        catalog.delete(product.id).await.unwrap();
        let ServerEvent::Products { products } = rx.recv().await.unwrap() else {
            panic!("expected products event");
        };
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_does_not_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, hub) = catalog(&dir).await;
        let mut rx = hub.subscribe();

        let mut bad = input("ALF-2");
        bad.title = None;
        let err = catalog.create(bad).await.unwrap_err();
        assert_eq!(err.client_message(), "field 'title' is required");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_product_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, _hub) = catalog(&dir).await;
        let id = ProductId::new(42);

        let err = catalog.get(id).await.unwrap_err();
        assert_eq!(err.client_message(), "product 42 not found");

        let update = ProductUpdate {
            stock: Some(1),
            ..ProductUpdate::default()
        };
        assert!(matches!(
            catalog.update(id, update).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.update(id, ProductUpdate::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
