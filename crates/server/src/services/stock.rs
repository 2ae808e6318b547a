//! Periodic stock maintenance.
//!
//! The `in_stock` flags on products and variations are denormalized from
//! their quantities. The checkout path keeps them current on its own
//! writes; this sweeper repairs drift from out-of-band quantity edits.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db;

/// Spawn the background sweeper. Runs until the process exits.
pub fn spawn_stock_sweeper(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately; start with a clean catalog.
        loop {
            ticker.tick().await;
            match db::catalog::reconcile_stock_flags(&pool).await {
                Ok(sweep) if sweep.is_clean() => debug!("Stock flags already consistent"),
                Ok(sweep) => {
                    info!(
                        products = sweep.products,
                        variations = sweep.variations,
                        "Reconciled stale stock flags"
                    );
                }
                Err(err) => warn!(error = %err, "Stock sweep failed"),
            }
        }
    })
}
