//! Order route handlers.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use duka_core::{CartId, OrderId};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Order, OrderItem, Shipment};
use crate::services::checkout::CheckoutRequest;
use crate::state::AppState;

/// Payload for `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Defaults to the caller's open cart.
    #[serde(default)]
    pub cart_id: Option<CartId>,
    pub address: String,
    pub phone_number: String,
    pub payment_method: String,
}

/// An order with its line items and shipment.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipment: Option<Shipment>,
}

/// `POST /orders`: check out a cart into an order.
#[instrument(skip(state, request))]
pub async fn place(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let cart_id = match request.cart_id {
        Some(id) => id,
        None => db::carts::open_cart(state.pool(), user_id)
            .await?
            .ok_or(AppError::EmptyCart)?
            .id,
    };

    let outcome = state
        .checkout()
        .checkout(
            user_id,
            CheckoutRequest {
                cart_id,
                address: request.address,
                phone_number: request.phone_number,
                payment_method: request.payment_method,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderView {
            order: outcome.order,
            items: outcome.items,
            shipment: Some(outcome.shipment),
        }),
    ))
}

/// `GET /orders`: the caller's orders, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Order>>> {
    let orders = db::orders::list_for_user(state.pool(), user_id).await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}`: one order with items and shipment.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = db::orders::get_for_user(state.pool(), order_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    let items = db::orders::items(state.pool(), order.id).await?;
    let shipment = db::shipments::get_by_order_for_user(state.pool(), order.id, user_id).await?;

    Ok(Json(OrderView {
        order,
        items,
        shipment,
    }))
}

/// `GET /orders/{id}/shipment`: the order's shipment.
#[instrument(skip(state))]
pub async fn shipment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Shipment>> {
    let shipment = db::shipments::get_by_order_for_user(state.pool(), order_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shipment for order {order_id}")))?;
    Ok(Json(shipment))
}
