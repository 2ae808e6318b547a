//! Shipment row model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use duka_core::{OrderId, ShipmentId, ShipmentStatus};

/// Shipping details and tracking information for an order.
///
/// Exactly one shipment exists per order (unique FK), created in `pending`
/// when the order is placed. `shipped_at` and `delivered_at` are stamped
/// exactly when the corresponding status is entered.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: Option<String>,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub expected_delivery: Option<NaiveDate>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
