//! Payment row model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duka_core::{Amount, OrderId, PaymentId, PaymentStatus, UserId};

/// Record of a payment transaction.
///
/// Payments may settle a specific order or stand alone. For M-Pesa the
/// `transaction_id` is the `CheckoutRequestID` returned by the gateway; it
/// is globally unique once assigned and keys the asynchronous callbacks.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub phone_number: String,
    pub amount: Amount,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub method: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
