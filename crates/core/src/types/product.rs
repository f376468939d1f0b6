//! Product records and the business rules enforced before any write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Errors raised when a product fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    /// The product name is empty.
    #[error("product name is required")]
    NameRequired,
    /// The category is empty.
    #[error("product category is required")]
    CategoryRequired,
    /// The price is zero or negative.
    #[error("product price must be greater than zero")]
    NonPositivePrice,
    /// The offer price is present but zero or negative.
    #[error("product offer price must be greater than zero")]
    NonPositiveOfferPrice,
    /// A price has more than two decimal places.
    #[error("{field} must have at most 2 decimal places")]
    PricePrecision {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A price does not fit the stored range.
    #[error("{field} must be less than 10000000000")]
    PriceTooLarge {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The stock quantity is negative.
    #[error("product quantity cannot be negative")]
    NegativeQuantity,
    /// A text field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// A product as stored in the catalog.
///
/// `image_key` holds the durable object-storage key (or is empty). It is never
/// a signed URL; readers mint one from the key on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub country_of_origin: Option<String>,
    pub dimensions: Option<String>,
    pub artist_name: Option<String>,
    pub image_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product references a stored image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_key.is_empty()
    }
}

/// The caller-supplied, writable fields of a product.
///
/// Used for both creation and full updates. IDs, image keys and timestamps are
/// owned by the catalog and cannot be set through a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub offer_price: Option<Decimal>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
}

impl ProductDraft {
    /// Maximum length of a product name.
    pub const MAX_NAME_LENGTH: usize = 100;
    /// Maximum length of a product category.
    pub const MAX_CATEGORY_LENGTH: usize = 255;
    /// Maximum length of a product description.
    pub const MAX_DESCRIPTION_LENGTH: usize = 500;
    /// Maximum length of the optional attribute fields.
    pub const MAX_ATTRIBUTE_LENGTH: usize = 255;

    /// Check the draft against the catalog's business rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule violated, checked in this order: name, price,
    /// offer price, quantity, category, description, optional attributes.
    /// Prices must fit `NUMERIC(12, 2)`: at most two decimal places and
    /// below 10^10.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::NameRequired);
        }
        check_length("name", &self.name, Self::MAX_NAME_LENGTH)?;

        if self.price <= Decimal::ZERO {
            return Err(ProductValidationError::NonPositivePrice);
        }
        check_price("price", self.price)?;
        if let Some(offer) = self.offer_price {
            if offer <= Decimal::ZERO {
                return Err(ProductValidationError::NonPositiveOfferPrice);
            }
            check_price("offer_price", offer)?;
        }
        if self.quantity < 0 {
            return Err(ProductValidationError::NegativeQuantity);
        }
        if self.category.trim().is_empty() {
            return Err(ProductValidationError::CategoryRequired);
        }
        check_length("category", &self.category, Self::MAX_CATEGORY_LENGTH)?;
        check_length(
            "description",
            &self.description,
            Self::MAX_DESCRIPTION_LENGTH,
        )?;

        for (field, value) in [
            ("country_of_origin", &self.country_of_origin),
            ("dimensions", &self.dimensions),
            ("artist_name", &self.artist_name),
        ] {
            if let Some(value) = value {
                check_length(field, value, Self::MAX_ATTRIBUTE_LENGTH)?;
            }
        }

        Ok(())
    }
}

/// Maximum length of an object-storage key stored on a product.
pub const MAX_IMAGE_KEY_LENGTH: usize = 2048;

/// Check an image key before it is written to the catalog.
///
/// # Errors
///
/// Returns `ProductValidationError::TooLong` if the key exceeds
/// [`MAX_IMAGE_KEY_LENGTH`] characters.
pub fn validate_image_key(key: &str) -> Result<(), ProductValidationError> {
    check_length("image_key", key, MAX_IMAGE_KEY_LENGTH)
}

/// Largest value a `NUMERIC(12, 2)` column holds.
// 999_999_999_999 = 0xE8_D4A5_0FFF, scale 2 => 9_999_999_999.99
const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

fn check_price(field: &'static str, value: Decimal) -> Result<(), ProductValidationError> {
    if value.normalize().scale() > 2 {
        return Err(ProductValidationError::PricePrecision { field });
    }
    if value > MAX_PRICE {
        return Err(ProductValidationError::PriceTooLarge { field });
    }
    Ok(())
}

fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ProductValidationError> {
    if value.chars().count() > max {
        return Err(ProductValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Filter for catalog listings.
///
/// Every supported filter is a typed field; an empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Only list products in this category.
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductFilter {
    /// Filter by category.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }

    /// The category to filter by, ignoring blank values.
    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }
}
