//! Database operations for payments.
//!
//! Every status write here is a compare-and-set with the legal source
//! states in the predicate, so late or duplicated gateway callbacks can
//! never overwrite a terminal status.

use sqlx::PgPool;

use duka_core::{Amount, OrderId, PaymentId, PaymentStatus, TerminalOutcome, UserId};

use super::RepositoryError;
use crate::models::Payment;

const PAYMENT_COLUMNS: &str = "id, user_id, order_id, phone_number, amount, transaction_id, \
                               status, method, description, created_at, updated_at";

/// Insert a payment in `initiated` status.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn insert(
    pool: &PgPool,
    user_id: UserId,
    order_id: Option<OrderId>,
    phone_number: &str,
    amount: Amount,
    method: &str,
    description: &str,
) -> Result<Payment, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r"
        INSERT INTO payments (user_id, order_id, phone_number, amount, method, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(order_id)
    .bind(phone_number)
    .bind(amount)
    .bind(method)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(payment)
}

/// Get a payment by id if it belongs to the user.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_for_user(
    pool: &PgPool,
    payment_id: PaymentId,
    user_id: UserId,
) -> Result<Option<Payment>, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND user_id = $2"
    ))
    .bind(payment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// List a user's payments, newest first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<Payment>, RepositoryError> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

/// Record gateway acceptance: `initiated -> pending`, storing the
/// transaction reference.
///
/// Returns `None` if the payment was not in `initiated` (e.g. a concurrent
/// dispatch already failed it).
///
/// # Errors
///
/// Returns [`RepositoryError::Conflict`] if the transaction id is already
/// taken by another payment.
pub async fn mark_dispatched(
    pool: &PgPool,
    payment_id: PaymentId,
    transaction_id: &str,
) -> Result<Option<Payment>, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r"
        UPDATE payments
        SET status = 'pending', transaction_id = $2, updated_at = now()
        WHERE id = $1 AND status = 'initiated'
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(payment_id)
    .bind(transaction_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!(
                "transaction id {transaction_id} already recorded"
            ));
        }
        RepositoryError::Database(e)
    })?;

    Ok(payment)
}

/// Record dispatch failure: `initiated -> failed`.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn mark_dispatch_failed(
    pool: &PgPool,
    payment_id: PaymentId,
) -> Result<Option<Payment>, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r"
        UPDATE payments
        SET status = 'failed', updated_at = now()
        WHERE id = $1 AND status = 'initiated'
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Result of applying a terminal callback to a payment.
#[derive(Debug)]
pub struct TerminalApplication {
    pub outcome: TerminalOutcome,
    pub payment: Payment,
}

/// Apply a terminal status keyed by the gateway's transaction reference.
///
/// One UPDATE attempts the non-terminal -> terminal move; if no row
/// changed, the current row decides between idempotent no-op and rejected
/// conflict via [`PaymentStatus::apply_terminal`].
///
/// Returns `None` when no payment carries the transaction id.
///
/// # Errors
///
/// Returns error if the database operations fail.
pub async fn apply_terminal(
    pool: &PgPool,
    transaction_id: &str,
    terminal: PaymentStatus,
) -> Result<Option<TerminalApplication>, RepositoryError> {
    debug_assert!(terminal.is_terminal());

    let updated = sqlx::query_as::<_, Payment>(&format!(
        r"
        UPDATE payments
        SET status = $2, updated_at = now()
        WHERE transaction_id = $1 AND status IN ('initiated', 'pending')
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(transaction_id)
    .bind(terminal)
    .fetch_optional(pool)
    .await?;

    if let Some(payment) = updated {
        return Ok(Some(TerminalApplication {
            outcome: TerminalOutcome::Applied,
            payment,
        }));
    }

    let existing = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = $1"
    ))
    .bind(transaction_id)
    .fetch_optional(pool)
    .await?;

    Ok(existing.map(|payment| TerminalApplication {
        outcome: payment.status.apply_terminal(terminal),
        payment,
    }))
}

/// Whether a completed payment already settles the order.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn order_settled(pool: &PgPool, order_id: OrderId) -> Result<bool, RepositoryError> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM payments WHERE order_id = $1 AND status = 'completed' LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}
