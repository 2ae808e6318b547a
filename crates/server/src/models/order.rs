//! Order row models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duka_core::{Amount, OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariationId};

/// A placed order.
///
/// Immutable once created except for `status`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Amount,
    pub address: String,
    pub phone_number: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item within an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
    /// Snapshot of the unit price at checkout time. Re-priced from the
    /// catalog at checkout, independent of the cart item's snapshot.
    pub price: Amount,
}
