//! JSON file repositories.
//!
//! Each entity lives in a single JSON array on disk. Every operation reads
//! the whole file, so edits made by hand between requests are picked up.
//! Mutations hold a per-file lock across read, modify and write, and write
//! through a temporary file that is renamed into place.

use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use mercado_core::{
    Cart, CartChange, CartId, Page, Product, ProductDraft, ProductId, ProductQuery, ProductUpdate,
};

use super::{CartRepository, ProductRepository, RepositoryError};

/// A JSON array of `T` stored in one file.
pub struct JsonFileStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonFileStore<T> {
    /// Open a JSON file, creating it (and its directory) as `[]` if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file or directory cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        if !tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "Creating empty data file");
            tokio::fs::write(&path, "[]").await?;
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
            _entity: PhantomData,
        })
    }

    /// Read every record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be read, or
    /// `RepositoryError::DataCorruption` if it is not a valid JSON array.
    pub async fn load(&self) -> Result<Vec<T>, RepositoryError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Read, modify and write back the records under the file lock.
    ///
    /// Nothing is written if `change` returns an error.
    ///
    /// # Errors
    ///
    /// Returns the error from `change`, or an I/O or serialization error.
    pub async fn update<R>(
        &self,
        change: impl FnOnce(&mut Vec<T>) -> Result<R, RepositoryError> + Send,
    ) -> Result<R, RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let result = change(&mut items)?;
        self.write(&items).await?;
        Ok(result)
    }

    async fn read(&self) -> Result<Vec<T>, RepositoryError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| {
            RepositoryError::DataCorruption(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write(&self, items: &[T]) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// =============================================================================
// Products
// =============================================================================

/// Product repository backed by `products.json`.
pub struct FileProductRepository {
    file: JsonFileStore<Product>,
}

impl FileProductRepository {
    /// Open (or create) the products file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        Ok(Self {
            file: JsonFileStore::open(path).await?,
        })
    }
}

#[async_trait]
impl ProductRepository for FileProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError> {
        let products = self.file.load().await?;
        Ok(query.apply(&products))
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.file.load().await?;
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.file.load().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    #[instrument(skip(self, draft), fields(code = %draft.code))]
    async fn create(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        self.file
            .update(move |products| {
                if products.iter().any(|p| p.code == draft.code) {
                    return Err(RepositoryError::duplicate_code(&draft.code));
                }
                let id = match products.iter().map(|p| p.id).max() {
                    Some(max) => max.next().ok_or(RepositoryError::IdsExhausted("product"))?,
                    None => ProductId::new(1),
                };
                let product = draft.into_product(id);
                products.push(product.clone());
                Ok(product)
            })
            .await
    }

    #[instrument(skip(self, update))]
    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        self.file
            .update(move |products| {
                let mut updated = products
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or(RepositoryError::NotFound)?;
                updated.apply_update(update)?;

                if products
                    .iter()
                    .any(|p| p.id != id && p.code == updated.code)
                {
                    return Err(RepositoryError::duplicate_code(&updated.code));
                }

                if let Some(slot) = products.iter_mut().find(|p| p.id == id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.file
            .update(move |products| {
                let index = products
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or(RepositoryError::NotFound)?;
                Ok(products.remove(index))
            })
            .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.file.load().await?.len() as u64)
    }
}

// =============================================================================
// Carts
// =============================================================================

/// Cart repository backed by `carts.json`.
pub struct FileCartRepository {
    file: JsonFileStore<Cart>,
}

impl FileCartRepository {
    /// Open (or create) the carts file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        Ok(Self {
            file: JsonFileStore::open(path).await?,
        })
    }
}

#[async_trait]
impl CartRepository for FileCartRepository {
    async fn list(&self) -> Result<Vec<Cart>, RepositoryError> {
        let mut carts = self.file.load().await?;
        carts.sort_by_key(|c| c.id);
        Ok(carts)
    }

    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let carts = self.file.load().await?;
        Ok(carts.into_iter().find(|c| c.id == id))
    }

    #[instrument(skip(self))]
    async fn create(&self) -> Result<Cart, RepositoryError> {
        self.file
            .update(|carts| {
                let id = match carts.iter().map(|c| c.id).max() {
                    Some(max) => max.next().ok_or(RepositoryError::IdsExhausted("cart"))?,
                    None => CartId::new(1),
                };
                let cart = Cart::new(id);
                carts.push(cart.clone());
                Ok(cart)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn modify(&self, id: CartId, change: CartChange) -> Result<Cart, RepositoryError> {
        self.file
            .update(move |carts| {
                let cart = carts
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or(RepositoryError::NotFound)?;
                cart.apply(change)?;
                Ok(cart.clone())
            })
            .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.file.load().await?.len() as u64)
    }
}
