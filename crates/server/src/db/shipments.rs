//! Database operations for shipments.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use duka_core::{OrderId, ShipmentId, ShipmentStatus, UserId};

use super::RepositoryError;
use crate::models::Shipment;

const SHIPMENT_COLUMNS: &str = "id, order_id, tracking_number, carrier, status, shipped_at, \
                                expected_delivery, delivered_at, created_at, updated_at";

/// Create the pending shipment for a freshly placed order.
///
/// The unique FK on `order_id` makes this idempotent at the schema level; a
/// duplicate event surfaces as a Conflict rather than a second shipment.
///
/// # Errors
///
/// Returns [`RepositoryError::Conflict`] if the order already has a
/// shipment.
pub async fn insert_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Shipment, RepositoryError> {
    let shipment = sqlx::query_as::<_, Shipment>(&format!(
        r"
        INSERT INTO shipments (order_id)
        VALUES ($1)
        RETURNING {SHIPMENT_COLUMNS}
        "
    ))
    .bind(order_id)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!("order {order_id} already has a shipment"));
        }
        RepositoryError::Database(e)
    })?;

    Ok(shipment)
}

/// Get a shipment by id, regardless of owner. Operator use only.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get(
    pool: &PgPool,
    shipment_id: ShipmentId,
) -> Result<Option<Shipment>, RepositoryError> {
    let shipment = sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1"
    ))
    .bind(shipment_id)
    .fetch_optional(pool)
    .await?;

    Ok(shipment)
}

/// Get a shipment by id if its order belongs to the user.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_for_user(
    pool: &PgPool,
    shipment_id: ShipmentId,
    user_id: UserId,
) -> Result<Option<Shipment>, RepositoryError> {
    let shipment = sqlx::query_as::<_, Shipment>(
        r"
        SELECT s.id, s.order_id, s.tracking_number, s.carrier, s.status, s.shipped_at,
               s.expected_delivery, s.delivered_at, s.created_at, s.updated_at
        FROM shipments s
        JOIN orders o ON o.id = s.order_id
        WHERE s.id = $1 AND o.user_id = $2
        ",
    )
    .bind(shipment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(shipment)
}

/// Get the shipment for an order owned by the user.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_by_order_for_user(
    pool: &PgPool,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Option<Shipment>, RepositoryError> {
    let shipment = sqlx::query_as::<_, Shipment>(
        r"
        SELECT s.id, s.order_id, s.tracking_number, s.carrier, s.status, s.shipped_at,
               s.expected_delivery, s.delivered_at, s.created_at, s.updated_at
        FROM shipments s
        JOIN orders o ON o.id = s.order_id
        WHERE s.order_id = $1 AND o.user_id = $2
        ",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(shipment)
}

/// Fields an operator may set alongside a status transition.
#[derive(Debug, Clone, Default)]
pub struct ShipmentUpdate {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub expected_delivery: Option<NaiveDate>,
}

/// Move a shipment's status, guarded by the expected current status.
///
/// `shipped_at`/`delivered_at` are stamped exactly when the corresponding
/// status is entered. Returns `None` if the shipment was no longer in
/// `from` (a concurrent transition won).
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn transition_status(
    pool: &PgPool,
    shipment_id: ShipmentId,
    from: ShipmentStatus,
    to: ShipmentStatus,
    update: &ShipmentUpdate,
) -> Result<Option<Shipment>, RepositoryError> {
    let shipment = sqlx::query_as::<_, Shipment>(&format!(
        r"
        UPDATE shipments
        SET status = $3,
            tracking_number = COALESCE($4, tracking_number),
            carrier = COALESCE($5, carrier),
            expected_delivery = COALESCE($6, expected_delivery),
            shipped_at = CASE WHEN $3 = 'shipped'::shipment_status THEN now() ELSE shipped_at END,
            delivered_at = CASE WHEN $3 = 'delivered'::shipment_status THEN now() ELSE delivered_at END,
            updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING {SHIPMENT_COLUMNS}
        "
    ))
    .bind(shipment_id)
    .bind(from)
    .bind(to)
    .bind(update.tracking_number.as_deref())
    .bind(update.carrier.as_deref())
    .bind(update.expected_delivery)
    .fetch_optional(pool)
    .await?;

    Ok(shipment)
}
