//! Shipment tracker: operator-driven status transitions.
//!
//! Transitions are validated against the shipment state machine before
//! touching the database, and the database write itself is guarded by the
//! expected current status, so concurrent operators cannot race a shipment
//! through an illegal path. Forward progress on the happy path is mirrored
//! onto the parent order.

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use duka_core::{OrderStatus, ShipmentId, ShipmentStatus, UserId};

use crate::db::{self, shipments::ShipmentUpdate};
use crate::error::{AppError, Result};
use crate::models::Shipment;

/// The shipment tracker.
#[derive(Clone)]
pub struct ShipmentService {
    pool: PgPool,
}

impl ShipmentService {
    /// Create a new shipment service.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Move a shipment to a new status, optionally attaching tracking
    /// details.
    ///
    /// `shipped` and `delivered` are mirrored onto the order as `shipped`
    /// and `delivered`; `lost` and `returned` leave the order for manual
    /// resolution.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the shipment does not exist
    /// - [`AppError::InvalidTransition`] if the move is not a legal edge of
    ///   the state machine, or a concurrent transition got there first
    #[instrument(skip(self, update), fields(shipment_id = %shipment_id, to = %to))]
    pub async fn update_status(
        &self,
        shipment_id: ShipmentId,
        to: ShipmentStatus,
        update: ShipmentUpdate,
    ) -> Result<Shipment> {
        let current = db::shipments::get(&self.pool, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id}")))?;

        if !current.status.can_transition_to(to) {
            return Err(AppError::invalid_transition(current.status, to));
        }

        let shipment =
            db::shipments::transition_status(&self.pool, shipment_id, current.status, to, &update)
                .await?
                .ok_or_else(|| {
                    // Lost the race; report against whatever won.
                    AppError::invalid_transition(current.status, to)
                })?;

        info!(order_id = %shipment.order_id, status = %shipment.status, "Shipment transitioned");

        match to {
            ShipmentStatus::Shipped => {
                self.mirror_order(&shipment, OrderStatus::Shipped).await?;
            }
            ShipmentStatus::Delivered => {
                self.mirror_order(&shipment, OrderStatus::Delivered).await?;
            }
            ShipmentStatus::Pending | ShipmentStatus::Lost | ShipmentStatus::Returned => {}
        }

        Ok(shipment)
    }

    /// Mirror a shipment transition onto the parent order, best-effort.
    ///
    /// The source status is whatever the order currently holds (a shipment
    /// can ship before the payment settles, so `pending` is a legal source
    /// for `shipped`); an order that cannot legally follow stays put.
    async fn mirror_order(&self, shipment: &Shipment, to: OrderStatus) -> Result<()> {
        let Some(from) = db::orders::status(&self.pool, shipment.order_id).await? else {
            warn!(order_id = %shipment.order_id, "Order missing for shipment");
            return Ok(());
        };

        if !from.can_transition_to(to) {
            // Cancelled or manually resolved orders stay put; the shipment
            // record is still authoritative for fulfilment.
            warn!(
                order_id = %shipment.order_id,
                status = %from,
                "Order did not follow shipment transition"
            );
            return Ok(());
        }

        let moved = db::orders::transition_status(&self.pool, shipment.order_id, from, to).await?;
        if !moved {
            warn!(order_id = %shipment.order_id, "Order moved concurrently; mirror skipped");
        }
        Ok(())
    }

    /// Get a shipment by id if its order belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if absent or owned by someone else.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        shipment_id: ShipmentId,
    ) -> Result<Shipment> {
        db::shipments::get_for_user(&self.pool, shipment_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id}")))
    }

    /// Get a shipment by id, regardless of owner. Operator use only.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the shipment does not exist.
    pub async fn get(&self, shipment_id: ShipmentId) -> Result<Shipment> {
        db::shipments::get(&self.pool, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id}")))
    }
}
