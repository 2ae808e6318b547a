//! Integration tests for Duka.
//!
//! The tests under `tests/` exercise the lifecycle rules through the
//! library crates without a running server or database: checkout planning,
//! the order/shipment/payment state machines, and gateway callback
//! handling are all pure over in-memory rows, which is what makes that
//! possible.
//!
//! The `#[ignore]`d tests in `tests/database_lifecycle.rs` run the same
//! scenarios through the repositories against a live `PostgreSQL`
//! instance. Point `DUKA_DATABASE_URL` at a disposable database and pass
//! `-- --ignored` to include them.

/// Fixture builders shared by the test files.
pub mod fixtures;
