//! Payment route handlers.
//!
//! The callback endpoint is what the gateway calls, not a user; it always
//! answers with Daraja's expected acknowledgement shape on success.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use duka_core::{Amount, OrderId, PaymentId};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::Payment;
use crate::mpesa::StkCallbackEnvelope;
use crate::services::payments::PaymentRequest;
use crate::state::AppState;

/// Payload for `POST /payments`.
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub phone_number: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /payments`: initiate an STK push payment.
#[instrument(skip(state, request))]
pub async fn initiate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let amount =
        Amount::new(request.amount).map_err(|e| AppError::Validation(e.to_string()))?;
    let description = request
        .description
        .unwrap_or_else(|| "Duka order payment".to_owned());

    let payment = state
        .payments()
        .initiate(
            user_id,
            PaymentRequest {
                order_id: request.order_id,
                phone_number: request.phone_number,
                amount,
                description,
            },
        )
        .await?;

    Ok((StatusCode::ACCEPTED, Json(payment)))
}

/// `GET /payments`: the caller's payments, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Payment>>> {
    let payments = state.payments().list(user_id).await?;
    Ok(Json(payments))
}

/// `GET /payments/{id}`: one payment.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<Payment>> {
    let payment = state.payments().get(user_id, payment_id).await?;
    Ok(Json(payment))
}

/// Daraja's expected callback acknowledgement.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: &'static str,
}

/// `POST /payments/callback`: gateway result callback.
#[instrument(skip(state, envelope))]
pub async fn callback(
    State(state): State<AppState>,
    Json(envelope): Json<StkCallbackEnvelope>,
) -> Result<Json<CallbackAck>> {
    state
        .payments()
        .handle_callback(&envelope.body.stk_callback)
        .await?;

    Ok(Json(CallbackAck {
        result_code: 0,
        result_desc: "Accepted",
    }))
}
