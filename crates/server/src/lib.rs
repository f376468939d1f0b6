//! Catalog server library.
//!
//! Product catalog, per-user carts and product images behind an axum HTTP
//! gateway. Storage is reached through the traits in [`ports`]; `PostgreSQL`
//! and S3-compatible adapters live in [`db`] and [`storage`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod ports;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
