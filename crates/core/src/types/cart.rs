//! Cart line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, UserId};

/// One product in a user's cart.
///
/// The `(user_id, product_id)` pair is the natural key: a cart holds at most
/// one item per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
