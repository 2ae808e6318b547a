//! User row model.
//!
//! Authentication is delegated to an upstream identity provider; this row
//! only anchors ownership of carts/orders/payments and carries the address
//! used for notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duka_core::UserId;

/// A known user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
