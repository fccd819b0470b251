//! Core types for Mercado.
//!
//! This module provides type-safe wrappers and models for the catalog and
//! cart domain.

pub mod cart;
pub mod code;
pub mod id;
pub mod pagination;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{Cart, CartChange, CartError, CartLine};
pub use code::{ProductCode, ProductCodeError};
pub use id::*;
pub use pagination::{
    Page, PageInfo, ProductFilter, ProductQuery, ProductQueryParams, QueryError, SortOrder,
};
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product, ProductDraft, ProductUpdate, ValidationError};
pub use status::*;
