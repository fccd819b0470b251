//! Cart service.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{info, instrument};

use mercado_core::{Cart, CartChange, CartId, CartLine, Price, Product, ProductId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};

/// A cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulatedLine {
    pub product: Product,
    pub quantity: u32,
    pub subtotal: Price,
}

/// A cart with product details and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulatedCart {
    pub id: CartId,
    pub products: Vec<PopulatedLine>,
    pub total: Price,
}

impl PopulatedCart {
    /// Join cart lines with products. Lines without a product are dropped.
    #[must_use]
    pub fn build(cart: &Cart, products: &[Option<Product>]) -> Self {
        let lines: Vec<PopulatedLine> = cart
            .products
            .iter()
            .zip(products)
            .filter_map(|(line, product)| {
                product.as_ref().map(|product| PopulatedLine {
                    subtotal: product.price.times(line.quantity),
                    product: product.clone(),
                    quantity: line.quantity,
                })
            })
            .collect();
        let total = lines.iter().map(|line| line.subtotal).sum();

        Self {
            id: cart.id,
            products: lines,
            total,
        }
    }

    /// Total units across the populated lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products.iter().map(|line| line.quantity).sum()
    }
}

/// Cart operations with product existence checks.
#[derive(Clone)]
pub struct Carts {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

fn cart_not_found(id: CartId) -> AppError {
    AppError::NotFound(format!("cart {id} not found"))
}

impl Carts {
    /// Create a cart service.
    #[must_use]
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { carts, products }
    }

    /// Every cart with its raw lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn list(&self) -> Result<Vec<Cart>> {
        Ok(self.carts.list().await?)
    }

    /// Get a cart with its raw lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no cart has this ID.
    pub async fn get(&self, id: CartId) -> Result<Cart> {
        self.carts.get(id).await?.ok_or_else(|| cart_not_found(id))
    }

    /// Get a cart joined with current product records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no cart has this ID.
    pub async fn get_populated(&self, id: CartId) -> Result<PopulatedCart> {
        let cart = self.get(id).await?;
        let products =
            try_join_all(cart.products.iter().map(|line| self.products.get(line.product))).await?;
        Ok(PopulatedCart::build(&cart, &products))
    }

    /// Create an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Cart> {
        let cart = self.carts.create().await?;
        info!(cart_id = %cart.id, "Cart created");
        Ok(cart)
    }

    /// Add one unit of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart or product does not exist.
    #[instrument(skip(self))]
    pub async fn add_product(&self, id: CartId, product: ProductId) -> Result<Cart> {
        self.get(id).await?;
        self.ensure_product(product).await?;
        self.modify(id, CartChange::AddProduct(product)).await
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart or line does not exist, or a
    /// bad request for a zero quantity.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, id: CartId, product: ProductId, quantity: u32) -> Result<Cart> {
        self.modify(id, CartChange::SetQuantity(product, quantity))
            .await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart or line does not exist.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, id: CartId, product: ProductId) -> Result<Cart> {
        self.modify(id, CartChange::RemoveProduct(product)).await
    }

    /// Replace every line. Duplicate products are merged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart or any referenced product does
    /// not exist, or a bad request for a zero quantity.
    #[instrument(skip(self, lines))]
    pub async fn replace_products(&self, id: CartId, lines: Vec<CartLine>) -> Result<Cart> {
        self.get(id).await?;
        for line in &lines {
            self.ensure_product(line.product).await?;
        }
        self.modify(id, CartChange::ReplaceLines(lines)).await
    }

    /// Remove every line. The cart itself remains.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart does not exist.
    #[instrument(skip(self))]
    pub async fn clear(&self, id: CartId) -> Result<Cart> {
        self.modify(id, CartChange::Clear).await
    }

    /// Number of stored carts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if storage fails.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.carts.count().await?)
    }

    async fn ensure_product(&self, id: ProductId) -> Result<()> {
        match self.products.get(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("product {id} not found"))),
        }
    }

    async fn modify(&self, id: CartId, change: CartChange) -> Result<Cart> {
        self.carts.modify(id, change).await.map_err(|err| match err {
            RepositoryError::NotFound => cart_not_found(id),
            other => AppError::Database(other),
        })
    }
}
