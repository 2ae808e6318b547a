//! Typed lifecycle events and their dispatcher.
//!
//! The checkout engine and payment coordinator publish events here instead
//! of relying on implicit framework hooks. Writes with correctness
//! consequences (the order's pending shipment) happen inside the
//! publishing transaction, not here; the dispatcher only delivers the
//! fire-and-forget notifications, which never gate the transition that
//! triggered them.

use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::db;
use crate::models::{Order, Payment};
use crate::services::notifications::Notifier;

/// Events emitted by the lifecycle services.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A cart was converted into an order.
    OrderCreated(Order),
    /// A payment reached a terminal status.
    PaymentTerminal(Payment),
}

/// Dispatches lifecycle events to their handlers.
#[derive(Clone)]
pub struct EventDispatcher {
    pool: PgPool,
    notifier: Notifier,
}

impl EventDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub const fn new(pool: PgPool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Handle an order-created event: queue the confirmation email.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn order_created(&self, order: &Order) {
        self.spawn_notification(LifecycleEvent::OrderCreated(order.clone()));
    }

    /// Handle a payment-terminal event: queue the result email.
    #[instrument(skip(self, payment), fields(payment_id = %payment.id, status = %payment.status))]
    pub fn payment_terminal(&self, payment: &Payment) {
        self.spawn_notification(LifecycleEvent::PaymentTerminal(payment.clone()));
    }

    /// Fire-and-forget delivery of the notification for an event.
    fn spawn_notification(&self, event: LifecycleEvent) {
        let pool = self.pool.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notify(&pool, &notifier, &event).await {
                warn!(error = %e, ?event, "Notification failed (ignored)");
            }
        });
    }
}

/// Look up the owning user and send the email for an event.
async fn notify(
    pool: &PgPool,
    notifier: &Notifier,
    event: &LifecycleEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let user_id = match event {
        LifecycleEvent::OrderCreated(order) => order.user_id,
        LifecycleEvent::PaymentTerminal(payment) => payment.user_id,
    };

    let Some(user) = db::users::get(pool, user_id).await? else {
        warn!(%user_id, "User vanished before notification");
        return Ok(());
    };

    match event {
        LifecycleEvent::OrderCreated(order) => {
            notifier.order_confirmation(&user, order).await?;
        }
        LifecycleEvent::PaymentTerminal(payment) => {
            notifier.payment_result(&user, payment).await?;
        }
    }
    Ok(())
}
