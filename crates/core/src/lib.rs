//! Mercado Core - Shared catalog and cart types.
//!
//! This crate provides the domain types used across all Mercado components:
//! - `storefront` - REST API, server-rendered views and real-time channel
//! - `cli` - Command-line tools for migrations, seeding and stats
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Validation, pagination math and cart line merging live
//! here so every storage backend behaves the same way.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, product codes, products, carts, pagination and
//!   response statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
