//! Core types for the catalog service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod error;
pub mod id;
pub mod image;
pub mod product;

pub use cart::CartItem;
pub use error::ErrorKind;
pub use id::*;
pub use image::SignedUrl;
pub use product::{
    MAX_IMAGE_KEY_LENGTH, Product, ProductDraft, ProductFilter, ProductValidationError,
    validate_image_key,
};
