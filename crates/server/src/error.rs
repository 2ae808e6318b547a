//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` covering the lifecycle error kinds. Route
//! handlers return `Result<T, AppError>`; the `IntoResponse` impl maps each
//! kind to a status code and a JSON body, capturing server-class errors to
//! Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::mpesa::GatewayError;

/// Application-level error type for the Duka server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Payment gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Checkout was attempted on a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout requested more units than the catalog has.
    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// Checkout was attempted on a cart that has already been converted.
    #[error("Cart has already been checked out")]
    AlreadyCheckedOut,

    /// Illegal shipment or payment state change.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build an `InvalidTransition` from any pair of displayable statuses.
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Repository(_) | Self::Internal(_) | Self::Gateway(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::EmptyCart => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientStock { .. }
            | Self::AlreadyCheckedOut
            | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Repository(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Gateway(_) => "Payment gateway error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
