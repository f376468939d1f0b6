//! Business logic services.
//!
//! # Services
//!
//! - `catalog` - Product listing, lookup and writes; mints image URLs on read
//! - `cart` - Per-user cart lifecycle with product existence checks
//! - `images` - Product and preview image uploads

pub mod cart;
pub mod catalog;
pub mod error;
pub mod images;

pub use cart::CartService;
pub use catalog::{CatalogService, ProductView};
pub use error::ServiceError;
pub use images::ProductImageService;
