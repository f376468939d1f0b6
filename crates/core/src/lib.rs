//! Catalog Core - Shared types library.
//!
//! This crate provides common types used across all catalog components:
//! - `server` - HTTP service for the product catalog, carts and product images
//! - `cli` - Command-line tools for migrations and development tokens
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, products, cart items, signed URLs and error kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
