//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product CRUD; every mutation publishes a realtime snapshot
//! - `carts` - Cart operations with product existence checks and totals
//!
//! Services translate repository results into [`crate::error::AppError`] so
//! REST handlers, views, and the WebSocket handler share one set of rules.

pub mod carts;
pub mod catalog;

pub use carts::{Carts, PopulatedCart, PopulatedLine};
pub use catalog::Catalog;
