//! Shopping cart model and line-item merge rules.
//!
//! A cart holds at most one line per product. Adding a product that is
//! already present bumps that line's quantity instead of appending a new
//! line. All mutations go through [`Cart::apply`] so every storage backend
//! shares the same rules.

use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId};

/// Errors produced when a cart change cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The referenced product has no line in this cart.
    #[error("product {0} is not in the cart")]
    ProductNotInCart(ProductId),
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// One product reference and its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub products: Vec<CartLine>,
}

/// A mutation to apply to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// Add one unit of a product.
    AddProduct(ProductId),
    /// Set the quantity of an existing line.
    SetQuantity(ProductId, u32),
    /// Remove a product's line.
    RemoveProduct(ProductId),
    /// Replace every line, merging duplicates.
    ReplaceLines(Vec<CartLine>),
    /// Remove every line.
    Clear,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new(id: CartId) -> Self {
        Self {
            id,
            products: Vec::new(),
        }
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products.iter().map(|line| line.quantity).sum()
    }

    /// Apply a change.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotInCart` when updating or removing a
    /// product without a line, and `CartError::InvalidQuantity` for a zero
    /// quantity. On error the cart is unchanged.
    pub fn apply(&mut self, change: CartChange) -> Result<(), CartError> {
        match change {
            CartChange::AddProduct(product) => {
                match self.products.iter_mut().find(|line| line.product == product) {
                    Some(line) => line.quantity = line.quantity.saturating_add(1),
                    None => self.products.push(CartLine {
                        product,
                        quantity: 1,
                    }),
                }
            }
            CartChange::SetQuantity(product, quantity) => {
                if quantity == 0 {
                    return Err(CartError::InvalidQuantity);
                }
                let line = self
                    .products
                    .iter_mut()
                    .find(|line| line.product == product)
                    .ok_or(CartError::ProductNotInCart(product))?;
                line.quantity = quantity;
            }
            CartChange::RemoveProduct(product) => {
                let before = self.products.len();
                self.products.retain(|line| line.product != product);
                if self.products.len() == before {
                    return Err(CartError::ProductNotInCart(product));
                }
            }
            CartChange::ReplaceLines(lines) => {
                self.products = merge_lines(lines)?;
            }
            CartChange::Clear => self.products.clear(),
        }
        Ok(())
    }
}

/// Merge lines by product ID, summing quantities and keeping first-seen order.
fn merge_lines(lines: Vec<CartLine>) -> Result<Vec<CartLine>, CartError> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        match merged.iter_mut().find(|m| m.product == line.product) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    Ok(merged)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(id: i32) -> ProductId {
        ProductId::new(id)
    }

    fn quantity(cart: &Cart, product: ProductId) -> Option<u32> {
        cart.products
            .iter()
            .find(|line| line.product == product)
            .map(|line| line.quantity)
    }

    #[test]
    fn test_add_same_product_twice_increments() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(5))).unwrap();
        cart.apply(CartChange::AddProduct(pid(5))).unwrap();
        cart.apply(CartChange::AddProduct(pid(2))).unwrap();

        assert_eq!(
            cart.products,
            vec![
                CartLine {
                    product: pid(5),
                    quantity: 2
                },
                CartLine {
                    product: pid(2),
                    quantity: 1
                },
            ]
        );
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(1))).unwrap();
        cart.apply(CartChange::SetQuantity(pid(1), 9)).unwrap();
        assert_eq!(quantity(&cart, pid(1)), Some(9));

        assert_eq!(
            cart.apply(CartChange::SetQuantity(pid(1), 0)),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(
            cart.apply(CartChange::SetQuantity(pid(4), 2)),
            Err(CartError::ProductNotInCart(pid(4)))
        );
    }

    #[test]
    fn test_remove_product() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(1))).unwrap();
        cart.apply(CartChange::RemoveProduct(pid(1))).unwrap();
        assert!(cart.products.is_empty());
        assert_eq!(
            cart.apply(CartChange::RemoveProduct(pid(1))),
            Err(CartError::ProductNotInCart(pid(1)))
        );
    }

    #[test]
    fn test_replace_lines_merges_duplicates() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(8))).unwrap();
        cart.apply(CartChange::ReplaceLines(vec![
            CartLine {
                product: pid(3),
                quantity: 2,
            },
            CartLine {
                product: pid(4),
                quantity: 1,
            },
            CartLine {
                product: pid(3),
                quantity: 5,
            },
        ]))
        .unwrap();

        assert_eq!(cart.products.len(), 2);
        assert_eq!(quantity(&cart, pid(3)), Some(7));
        assert_eq!(quantity(&cart, pid(8)), None);
    }

    #[test]
    fn test_replace_lines_rejects_zero_quantity_without_changes() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(8))).unwrap();
        let result = cart.apply(CartChange::ReplaceLines(vec![CartLine {
            product: pid(3),
            quantity: 0,
        }]));
        assert_eq!(result, Err(CartError::InvalidQuantity));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new(CartId::new(1));
        cart.apply(CartChange::AddProduct(pid(8))).unwrap();
        cart.apply(CartChange::Clear).unwrap();
        assert_eq!(cart.item_count(), 0);
    }
}
