//! Database operations for the Duka `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Ownership anchor and notification addresses
//! - `categories` / `products` / `product_variations` - Catalog Store
//! - `carts` / `cart_items` - Cart Manager
//! - `orders` / `order_items` - Checkout Engine output
//! - `shipments` - Shipment Tracker (1:1 with orders)
//! - `payments` - Payment Coordinator
//!
//! Queries use runtime-checked `sqlx::query_as` with `FromRow` models;
//! functions take either a pool or a transaction connection so the checkout
//! sequence can compose repository calls inside one atomic unit.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p duka-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod payments;
pub mod shipments;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate transaction id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
