//! Duka Core - Shared types library.
//!
//! This crate provides common types used across all Duka components:
//! - `server` - JSON API serving the cart/order/payment/shipment lifecycle
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and transition rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere, including in tests that never touch a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, phone
//!   numbers, and lifecycle status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
