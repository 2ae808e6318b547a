//! Cart row models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duka_core::{Amount, CartId, CartItemId, ProductId, UserId, VariationId};

/// A shopping cart belonging to a user.
///
/// `checked_out` transitions false to true exactly once, at checkout; a new
/// cart is created lazily on the next item add.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub checked_out: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item in a shopping cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
    /// Snapshot of the unit price at the time of adding to cart, immune to
    /// later catalog price changes.
    pub price: Amount,
}

impl CartItem {
    /// The line total (`price * quantity`) for this item.
    #[must_use]
    pub fn line_total(&self) -> Amount {
        self.price.line_total(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// Derived total for a collection of cart items; never stored.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Amount {
    items
        .iter()
        .fold(Amount::ZERO, |total, item| total + item.line_total())
}
