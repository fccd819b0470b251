//! Catalog product model and input validation.
//!
//! Incoming product data arrives as [`NewProduct`] (create) or
//! [`ProductUpdate`] (partial update). Every field is optional at the
//! deserialization layer so that a missing field produces a message naming
//! it, rather than a generic decoding error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::code::{ProductCode, ProductCodeError};
use super::id::ProductId;
use super::price::{Price, PriceError};
use super::status::Availability;

/// Errors produced while validating product input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent, null, or blank.
    #[error("field '{0}' is required")]
    MissingField(&'static str),
    /// A field present in an update is blank.
    #[error("field '{0}' cannot be blank")]
    BlankField(&'static str),
    /// The product code is malformed.
    #[error("invalid code: {0}")]
    Code(#[from] ProductCodeError),
    /// The price is out of range.
    #[error("invalid price: {0}")]
    Price(#[from] PriceError),
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub code: ProductCode,
    pub price: Price,
    /// Whether the product is available for sale.
    pub status: bool,
    pub stock: u32,
    pub category: String,
    #[serde(default)]
    pub thumbnails: Vec<String>,
}

/// Unvalidated product creation input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<Decimal>,
    pub status: Option<bool>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub thumbnails: Option<Vec<String>>,
}

/// Validated product data awaiting an ID from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub code: ProductCode,
    pub price: Price,
    pub status: bool,
    pub stock: u32,
    pub category: String,
    pub thumbnails: Vec<String>,
}

/// Partial product update. Absent fields are left unchanged.
///
/// An `id` in the payload is ignored; product IDs never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<Decimal>,
    pub status: Option<bool>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub thumbnails: Option<Vec<String>>,
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ValidationError::BlankField(field)),
        Some(v) => Ok(Some(v.trim().to_owned())),
        None => Ok(None),
    }
}

impl NewProduct {
    /// Validate the input and produce a [`ProductDraft`].
    ///
    /// Required fields are checked in the order `title`, `description`,
    /// `code`, `price`, `stock`, `category`. `status` defaults to `true`
    /// and `thumbnails` to an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for the first missing required
    /// field, or a code/price error if those are malformed.
    pub fn validate(self) -> Result<ProductDraft, ValidationError> {
        let title = required_text(self.title, "title")?;
        let description = required_text(self.description, "description")?;
        let code = ProductCode::parse(&required_text(self.code, "code")?)?;
        let price = Price::new(self.price.ok_or(ValidationError::MissingField("price"))?)?;
        let stock = self.stock.ok_or(ValidationError::MissingField("stock"))?;
        let category = required_text(self.category, "category")?;

        Ok(ProductDraft {
            title,
            description,
            code,
            price,
            status: self.status.unwrap_or(true),
            stock,
            category,
            thumbnails: self.thumbnails.unwrap_or_default(),
        })
    }
}

impl ProductDraft {
    /// Attach a store-assigned ID.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            code: self.code,
            price: self.price,
            status: self.status,
            stock: self.stock,
            category: self.category,
            thumbnails: self.thumbnails,
        }
    }
}

impl Product {
    /// Availability derived from status and stock.
    #[must_use]
    pub const fn availability(&self) -> Availability {
        Availability::from_product(self.status, self.stock)
    }

    /// Apply a partial update.
    ///
    /// All fields are validated before any is written, so a failed update
    /// leaves the product untouched.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a text field is blank or the code/price
    /// is malformed.
    pub fn apply_update(&mut self, update: ProductUpdate) -> Result<(), ValidationError> {
        let title = optional_text(update.title, "title")?;
        let description = optional_text(update.description, "description")?;
        let category = optional_text(update.category, "category")?;
        let code = update
            .code
            .map(|c| ProductCode::parse(&c))
            .transpose()?;
        let price = update.price.map(Price::new).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(code) = code {
            self.code = code;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(thumbnails) = update.thumbnails {
            self.thumbnails = thumbnails;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_input() -> NewProduct {
        serde_json::from_value(json!({
            "title": "Yerba Mate",
            "description": "500g, traditional cut",
            "code": "YM-500",
            "price": 4.5,
            "stock": 20,
            "category": "drinks"
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_applies_defaults() {
        let draft = full_input().validate().unwrap();
        assert!(draft.status);
        assert!(draft.thumbnails.is_empty());
        assert_eq!(draft.code.as_str(), "YM-500");
        assert_eq!(draft.price.display(), "$4.50");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut input = full_input();
        input.description = Some("   ".to_string());
        input.stock = None;
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField("description"))
        );

        let mut input = full_input();
        input.stock = None;
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "field 'stock' is required");
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut input = full_input();
        input.price = Some(Decimal::new(-1, 0));
        assert_eq!(
            input.validate(),
            Err(ValidationError::Price(PriceError::Negative))
        );
    }

    #[test]
    fn test_update_ignores_id_and_keeps_absent_fields() {
        let mut product = full_input().validate().unwrap().into_product(ProductId::new(3));
        let update: ProductUpdate =
            serde_json::from_value(json!({"id": 99, "stock": 7, "status": false})).unwrap();
        product.apply_update(update).unwrap();

        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.stock, 7);
        assert!(!product.status);
        assert_eq!(product.title, "Yerba Mate");
    }

    #[test]
    fn test_failed_update_is_atomic() {
        let mut product = full_input().validate().unwrap().into_product(ProductId::new(1));
        let before = product.clone();
        let update = ProductUpdate {
            title: Some("New title".to_string()),
            category: Some(String::new()),
            ..ProductUpdate::default()
        };
        assert_eq!(
            product.apply_update(update),
            Err(ValidationError::BlankField("category"))
        );
        assert_eq!(product, before);
    }

    #[test]
    fn test_product_json_shape() {
        let product = full_input().validate().unwrap().into_product(ProductId::new(1));
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["price"], 4.5);
        assert_eq!(value["status"], true);
        assert_eq!(value["thumbnails"], json!([]));
    }
}
