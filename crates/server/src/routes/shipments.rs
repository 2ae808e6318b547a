//! Shipment route handlers.
//!
//! `PATCH /shipments/{id}` is the operator surface; customer reads go
//! through the order-scoped endpoints or `GET /shipments/{id}`.

use axum::{Json, extract::Path, extract::State};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use duka_core::{ShipmentId, ShipmentStatus};

use crate::db::shipments::ShipmentUpdate;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::Shipment;
use crate::state::AppState;

/// Payload for `PATCH /shipments/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub expected_delivery: Option<NaiveDate>,
}

/// `PATCH /shipments/{id}`: move a shipment through its lifecycle.
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    Path(shipment_id): Path<ShipmentId>,
    Json(request): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>> {
    let shipment = state
        .shipments()
        .update_status(
            shipment_id,
            request.status,
            ShipmentUpdate {
                tracking_number: request.tracking_number,
                carrier: request.carrier,
                expected_delivery: request.expected_delivery,
            },
        )
        .await?;

    Ok(Json(shipment))
}

/// `GET /shipments/{id}`: one shipment, scoped to the caller's orders.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shipment_id): Path<ShipmentId>,
) -> Result<Json<Shipment>> {
    let shipment = state.shipments().get_for_user(user_id, shipment_id).await?;
    Ok(Json(shipment))
}
