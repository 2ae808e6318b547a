//! Payment coordinator: initiates gateway payments and absorbs callbacks.
//!
//! The coordinator owns the payment state machine end to end. Initiation
//! writes the `initiated` row first and only then talks to the gateway, so
//! a crashed dispatch leaves an auditable record instead of a ghost charge.
//! Callbacks are applied as compare-and-set writes keyed by the gateway's
//! transaction reference, which makes duplicate and out-of-order callbacks
//! harmless.

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use duka_core::{
    Amount, OrderId, OrderStatus, PaymentId, PaymentStatus, PhoneNumber, TerminalOutcome, UserId,
};

use crate::db;
use crate::error::{AppError, Result};
use crate::models::Payment;
use crate::mpesa::{MpesaClient, StkCallback};
use crate::services::events::EventDispatcher;

/// A request to initiate a payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: Option<OrderId>,
    pub phone_number: String,
    pub amount: Amount,
    pub description: String,
}

/// The payment coordinator.
///
/// Constructed without a gateway client when M-Pesa is not configured; in
/// that mode initiation fails fast instead of stranding `initiated` rows.
#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    gateway: Option<MpesaClient>,
    events: EventDispatcher,
}

impl PaymentService {
    /// Create a new payment service.
    #[must_use]
    pub const fn new(pool: PgPool, gateway: Option<MpesaClient>, events: EventDispatcher) -> Self {
        Self {
            pool,
            gateway,
            events,
        }
    }

    /// Initiate a payment: persist the `initiated` row, then dispatch the
    /// STK push in the background.
    ///
    /// The returned payment is in `initiated` status; the caller polls it
    /// (or waits for the callback) to learn the outcome.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a zero amount or a malformed phone
    ///   number
    /// - [`AppError::NotFound`] if `order_id` is set but not the caller's
    /// - [`AppError::Validation`] if the order is already settled
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn initiate(&self, user_id: UserId, request: PaymentRequest) -> Result<Payment> {
        let Some(gateway) = self.gateway.clone() else {
            return Err(AppError::Internal(
                "payment gateway is not configured".to_owned(),
            ));
        };

        if request.amount == Amount::ZERO {
            return Err(AppError::Validation(
                "payment amount must be greater than zero".to_owned(),
            ));
        }
        let phone = PhoneNumber::parse(&request.phone_number)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(order_id) = request.order_id {
            let order = db::orders::get_for_user(&self.pool, order_id, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
            if db::payments::order_settled(&self.pool, order.id).await? {
                return Err(AppError::Validation(format!(
                    "order {order_id} is already paid"
                )));
            }
        }

        let payment = db::payments::insert(
            &self.pool,
            user_id,
            request.order_id,
            phone.as_str(),
            request.amount,
            "mpesa",
            &request.description,
        )
        .await?;

        info!(payment_id = %payment.id, amount = %payment.amount, "Payment initiated");

        let service = self.clone();
        let dispatched = payment.clone();
        tokio::spawn(async move {
            service.dispatch(gateway, dispatched, phone).await;
        });

        Ok(payment)
    }

    /// Send the STK push and record the gateway's answer.
    async fn dispatch(&self, gateway: MpesaClient, payment: Payment, phone: PhoneNumber) {
        let reference = payment
            .order_id
            .map_or_else(|| format!("PAY{}", payment.id), |id| format!("ORDER{id}"));

        match gateway
            .stk_push(&phone, payment.amount, &reference, &payment.description)
            .await
        {
            Ok(response) => {
                match db::payments::mark_dispatched(
                    &self.pool,
                    payment.id,
                    &response.checkout_request_id,
                )
                .await
                {
                    Ok(Some(_)) => {
                        info!(
                            payment_id = %payment.id,
                            transaction_id = %response.checkout_request_id,
                            "STK push accepted"
                        );
                    }
                    Ok(None) => {
                        warn!(
                            payment_id = %payment.id,
                            "Payment left initiated before dispatch completed"
                        );
                    }
                    Err(err) => {
                        warn!(payment_id = %payment.id, error = %err, "Failed to record dispatch");
                    }
                }
            }
            Err(err) => {
                warn!(payment_id = %payment.id, error = %err, "STK push failed");
                match db::payments::mark_dispatch_failed(&self.pool, payment.id).await {
                    Ok(Some(failed)) => self.events.payment_terminal(&failed),
                    Ok(None) => {}
                    Err(db_err) => {
                        warn!(
                            payment_id = %payment.id,
                            error = %db_err,
                            "Failed to record dispatch failure"
                        );
                    }
                }
            }
        }
    }

    /// Apply a gateway callback.
    ///
    /// Success completes the payment and, when it pays for an order, moves
    /// the order `pending -> processing`. Failure fails the payment. Either
    /// way the write is idempotent: a repeat of an already-applied callback
    /// is acknowledged without effect, while a callback contradicting the
    /// recorded terminal status is rejected.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no payment carries the transaction id
    /// - [`AppError::InvalidTransition`] if the payment already reached the
    ///   opposite terminal status
    #[instrument(skip(self, callback), fields(transaction_id = %callback.checkout_request_id))]
    pub async fn handle_callback(&self, callback: &StkCallback) -> Result<()> {
        let terminal = if callback.is_success() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };

        let application =
            db::payments::apply_terminal(&self.pool, &callback.checkout_request_id, terminal)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "payment with transaction id {}",
                        callback.checkout_request_id
                    ))
                })?;

        match application.outcome {
            TerminalOutcome::Applied => {
                info!(
                    payment_id = %application.payment.id,
                    status = %application.payment.status,
                    result_code = callback.result_code,
                    "Payment reached terminal status"
                );

                if terminal == PaymentStatus::Completed
                    && let Some(order_id) = application.payment.order_id
                {
                    self.settle_order(order_id).await?;
                }

                self.events.payment_terminal(&application.payment);
                Ok(())
            }
            TerminalOutcome::AlreadyApplied => {
                info!(
                    payment_id = %application.payment.id,
                    "Duplicate callback ignored"
                );
                Ok(())
            }
            TerminalOutcome::Conflict => {
                warn!(
                    payment_id = %application.payment.id,
                    recorded = %application.payment.status,
                    incoming = %terminal,
                    "Callback contradicts recorded terminal status"
                );
                Err(AppError::invalid_transition(
                    application.payment.status,
                    terminal,
                ))
            }
        }
    }

    /// Move the paid order into fulfilment.
    async fn settle_order(&self, order_id: OrderId) -> Result<()> {
        let moved = db::orders::transition_status(
            &self.pool,
            order_id,
            OrderStatus::Pending,
            OrderStatus::Processing,
        )
        .await?;

        if moved {
            info!(order_id = %order_id, "Order moved to processing");
        } else {
            // Paid twice, cancelled before the callback, or already being
            // fulfilled; the payment record stands either way.
            let current = db::orders::status(&self.pool, order_id).await?;
            warn!(order_id = %order_id, status = ?current, "Order not in pending at settlement");
        }
        Ok(())
    }

    /// Get a payment by id if it belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if absent or owned by someone else.
    pub async fn get(&self, user_id: UserId, payment_id: PaymentId) -> Result<Payment> {
        db::payments::get_for_user(&self.pool, payment_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment {payment_id}")))
    }

    /// List the user's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Payment>> {
        Ok(db::payments::list_for_user(&self.pool, user_id).await?)
    }
}
