//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /ready                   - Readiness check (pings the database)
//!
//! # Cart (requires X-User-Id)
//! GET    /cart                    - The open cart with items and total
//! POST   /cart/items              - Add an item (creates the cart lazily)
//! PATCH  /cart/items/{id}         - Set a line's quantity (0 removes)
//! DELETE /cart/items/{id}         - Remove a line
//!
//! # Orders (requires X-User-Id)
//! POST   /orders                  - Check out the cart
//! GET    /orders                  - Order history
//! GET    /orders/{id}             - One order with items and shipment
//! GET    /orders/{id}/shipment    - The order's shipment
//!
//! # Payments (requires X-User-Id except the callback)
//! POST   /payments                - Initiate an STK push payment
//! GET    /payments                - Payment history
//! GET    /payments/{id}           - One payment
//! POST   /payments/callback       - Gateway result callback
//!
//! # Shipments
//! PATCH  /shipments/{id}          - Operator status transition
//! GET    /shipments/{id}          - One shipment (requires X-User-Id)
//! ```

pub mod cart;
pub mod orders;
pub mod payments;
pub mod shipments;

use axum::{
    Json,
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use serde_json::json;

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place).get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/shipment", get(orders::shipment))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payments::initiate).get(payments::index))
        .route("/{id}", get(payments::show))
        .route("/callback", post(payments::callback))
}

/// Create the shipment routes router.
pub fn shipment_routes() -> Router<AppState> {
    Router::new().route("/{id}", patch(shipments::update).get(shipments::show))
}

/// Create all routes for the service.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/shipments", shipment_routes())
        .with_state(state)
}

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check; verifies the database answers.
async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
