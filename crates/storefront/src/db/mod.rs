//! Persistence for products and carts.
//!
//! Two interchangeable backends implement [`ProductRepository`] and
//! [`CartRepository`]:
//!
//! - [`file`] - one pretty-printed JSON array per entity
//!   (`products.json`, `carts.json`), rewritten after every mutation
//! - [`postgres`] - JSONB document collections in the `catalog` schema
//!
//! Filtering, pagination and cart line merging come from `mercado_core`,
//! so both backends answer identically.
//!
//! # Migrations
//!
//! `PostgreSQL` migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p mercado-cli -- migrate
//! ```

pub mod file;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use mercado_core::{
    Cart, CartChange, CartError, CartId, Page, Product, ProductCode, ProductDraft, ProductId,
    ProductQuery, ProductUpdate, ValidationError,
};

use crate::config::StorageConfig;

pub use file::{FileCartRepository, FileProductRepository};
pub use postgres::{PgCartRepository, PgProductRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error from the JSON file store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Every ID in the type's range is taken.
    #[error("no {0} ids left to assign")]
    IdsExhausted(&'static str),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate product code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Product update rejected by validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cart change rejected by cart rules.
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl RepositoryError {
    /// Conflict raised when a product code is already taken.
    #[must_use]
    pub fn duplicate_code(code: &ProductCode) -> Self {
        Self::Conflict(format!("a product with code '{code}' already exists"))
    }
}

/// Storage for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of products matching `query`.
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError>;

    /// Every product in ID order.
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Get a product by ID.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Store a new product and assign its ID.
    ///
    /// Fails with `RepositoryError::Conflict` if the code is taken.
    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError>;

    /// Apply a partial update.
    ///
    /// Fails with `NotFound`, `Validation`, or `Conflict` (code taken by
    /// another product).
    async fn update(&self, id: ProductId, update: ProductUpdate)
    -> Result<Product, RepositoryError>;

    /// Delete a product, returning it.
    async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Number of stored products.
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Storage for shopping carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Every cart in ID order.
    async fn list(&self) -> Result<Vec<Cart>, RepositoryError>;

    /// Get a cart by ID.
    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart.
    async fn create(&self) -> Result<Cart, RepositoryError>;

    /// Apply a change to a stored cart and persist the result.
    ///
    /// Fails with `NotFound` or `Cart` if the change is rejected; a rejected
    /// change is never persisted.
    async fn modify(&self, id: CartId, change: CartChange) -> Result<Cart, RepositoryError>;

    /// Number of stored carts.
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// The pair of repositories backing the application.
#[derive(Clone)]
pub struct Storage {
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
}

impl Storage {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the data files cannot be created or the
    /// database is unreachable.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, RepositoryError> {
        match config {
            StorageConfig::File { data_dir } => {
                let products = FileProductRepository::open(data_dir.join("products.json")).await?;
                let carts = FileCartRepository::open(data_dir.join("carts.json")).await?;
                Ok(Self {
                    products: Arc::new(products),
                    carts: Arc::new(carts),
                })
            }
            StorageConfig::Postgres { database_url } => {
                let pool = create_pool(database_url).await?;
                Ok(Self::postgres(pool))
            }
        }
    }

    /// Storage over an existing `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(PgProductRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool)),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
