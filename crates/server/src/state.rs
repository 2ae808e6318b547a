//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::mpesa::{GatewayError, MpesaClient};
use crate::services::{
    CheckoutService, EventDispatcher, Notifier, PaymentService, ShipmentService,
};

/// Error constructing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("payment gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the pool, configuration and the
/// lifecycle services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pool: PgPool,
    checkout: CheckoutService,
    payments: PaymentService,
    shipments: ShipmentService,
}

impl AppState {
    /// Create a new application state, wiring the services together.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport or the payment gateway
    /// client cannot be built from the configuration.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, StateError> {
        let notifier = Notifier::new(config.email.as_ref())?;
        let events = EventDispatcher::new(pool.clone(), notifier);

        let gateway = config
            .mpesa
            .clone()
            .map(MpesaClient::new)
            .transpose()?;

        let checkout = CheckoutService::new(pool.clone(), events.clone());
        let payments = PaymentService::new(pool.clone(), gateway, events);
        let shipments = ShipmentService::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
                payments,
                shipments,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the checkout engine.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get a reference to the payment coordinator.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }

    /// Get a reference to the shipment tracker.
    #[must_use]
    pub fn shipments(&self) -> &ShipmentService {
        &self.inner.shipments
    }
}
