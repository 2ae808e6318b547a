//! Integration tests for gateway callback handling.
//!
//! Covers the Daraja callback wire format and the HTTP status mapping of
//! the errors the callback and payment endpoints can produce.

use axum::http::StatusCode;
use axum::response::IntoResponse;

use duka_core::PaymentStatus;
use duka_integration_tests::fixtures::payment;
use duka_server::error::AppError;
use duka_server::mpesa::{StkCallback, StkCallbackEnvelope};

// =============================================================================
// Callback Wire Format
// =============================================================================

fn envelope(result_code: i64) -> String {
    format!(
        r#"{{
            "Body": {{
                "stkCallback": {{
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": {result_code},
                    "ResultDesc": "The service request is processed successfully."
                }}
            }}
        }}"#
    )
}

#[test]
fn test_success_callback_parses() {
    let parsed: StkCallbackEnvelope = serde_json::from_str(&envelope(0)).expect("valid envelope");
    let callback = parsed.body.stk_callback;

    assert_eq!(callback.checkout_request_id, "ws_CO_191220191020363925");
    assert!(callback.is_success());
}

#[test]
fn test_nonzero_result_code_is_failure() {
    // 1032 is the payer-cancelled code; any nonzero code fails the payment.
    let parsed: StkCallbackEnvelope =
        serde_json::from_str(&envelope(1032)).expect("valid envelope");
    assert!(!parsed.body.stk_callback.is_success());
}

#[test]
fn test_callback_requires_the_envelope_shape() {
    // A bare callback object without the Body wrapper must not parse.
    let bare = r#"{
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": "ws_CO_191220191020363925",
        "ResultCode": 0,
        "ResultDesc": "ok"
    }"#;
    assert!(serde_json::from_str::<StkCallbackEnvelope>(bare).is_err());
    assert!(serde_json::from_str::<StkCallback>(bare).is_ok());
}

// =============================================================================
// Terminal Decision over Row State
// =============================================================================

#[test]
fn test_recorded_payment_rejects_contradicting_callback() {
    // Row already completed, a failure callback arrives late.
    let row = payment(1, PaymentStatus::Completed, Some("ws_CO_1"));
    assert_eq!(
        row.status.apply_terminal(PaymentStatus::Failed),
        duka_core::TerminalOutcome::Conflict
    );
}

#[test]
fn test_recorded_payment_absorbs_duplicate_callback() {
    let row = payment(1, PaymentStatus::Failed, Some("ws_CO_1"));
    assert_eq!(
        row.status.apply_terminal(PaymentStatus::Failed),
        duka_core::TerminalOutcome::AlreadyApplied
    );
}

// =============================================================================
// HTTP Status Mapping
// =============================================================================

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_unknown_transaction_maps_to_not_found() {
    assert_eq!(
        status_of(AppError::NotFound("payment with transaction id x".into())),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_conflicting_callback_maps_to_conflict() {
    assert_eq!(
        status_of(AppError::invalid_transition("completed", "failed")),
        StatusCode::CONFLICT
    );
}

#[test]
fn test_checkout_failures_map_to_conflict_and_bad_request() {
    assert_eq!(
        status_of(AppError::InsufficientStock {
            product: "Ceramic Mug".into(),
            requested: 3,
            available: 1,
        }),
        StatusCode::CONFLICT
    );
    assert_eq!(status_of(AppError::AlreadyCheckedOut), StatusCode::CONFLICT);
    assert_eq!(status_of(AppError::EmptyCart), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_of(AppError::Validation("quantity must be at least 1".into())),
        StatusCode::BAD_REQUEST
    );
}
