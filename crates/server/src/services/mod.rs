//! Domain services for the order lifecycle.
//!
//! Route handlers stay thin; the lifecycle rules live here. Each service
//! owns a pool handle and composes repository calls; side effects flow
//! through the [`events::EventDispatcher`] rather than implicit hooks.

pub mod checkout;
pub mod events;
pub mod notifications;
pub mod payments;
pub mod shipments;
pub mod stock;

pub use checkout::CheckoutService;
pub use events::EventDispatcher;
pub use notifications::Notifier;
pub use payments::PaymentService;
pub use shipments::ShipmentService;
