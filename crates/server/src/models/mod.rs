//! Row models for the lifecycle tables.
//!
//! These map 1:1 onto the schema in `migrations/0001_schema.sql` via
//! `sqlx::FromRow`. API response shapes live next to their route handlers.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod shipment;
pub mod user;

pub use cart::{Cart, CartItem, cart_total};
pub use catalog::{Product, ProductVariation};
pub use order::{Order, OrderItem};
pub use payment::Payment;
pub use shipment::Shipment;
pub use user::User;
