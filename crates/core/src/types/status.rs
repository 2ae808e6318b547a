//! Lifecycle status enums and their transition rules.
//!
//! Orders, shipments and payments each carry a small state machine. The
//! transition rules live here, next to the enums, so that repositories and
//! services can enforce them without duplicating the matrices. Terminal
//! states are one-way: once reached, no further transition is permitted.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// `Pending` is the initial state set at checkout. A completed payment moves
/// the order to `Processing`; shipment progress mirrors onto `Shipped` and
/// `Delivered`. `Cancelled` and `Failed` are reachable from any non-terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Whether no further transition is permitted from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Processing)
            | (Self::Pending | Self::Processing, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (from, Self::Cancelled | Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Shipment tracking status.
///
/// Exactly one shipment exists per order, created in `Pending` when the
/// order is placed. `Lost` and `Returned` are only reachable from `Shipped`;
/// backward transitions are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shipment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Lost,
    Returned,
}

impl ShipmentStatus {
    /// Whether no further transition is permitted from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Lost | Self::Returned)
    }

    /// Whether a transition from `self` to `next` is legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped)
                | (Self::Shipped, Self::Delivered | Self::Lost | Self::Returned)
        )
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Lost => write!(f, "lost"),
            Self::Returned => write!(f, "returned"),
        }
    }
}

/// Payment processing status.
///
/// `Initiated` is set when the payment row is created, before the gateway is
/// contacted. Acceptance of the STK push moves it to `Pending`; the terminal
/// result (`Completed`/`Failed`) arrives asynchronously via callback.
/// `Initiated -> Failed` covers dispatch rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Initiated,
    Pending,
    Completed,
    Failed,
}

/// Outcome of applying a terminal status to a payment.
///
/// Callbacks can arrive late, duplicated, or out of order; the terminal
/// write is a compare-and-set and this enum names the three possible
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// The payment moved into the terminal status.
    Applied,
    /// The payment was already in this terminal status; nothing changed.
    AlreadyApplied,
    /// The payment is in a *different* terminal status; the write was
    /// rejected.
    Conflict,
}

impl PaymentStatus {
    /// Whether no further transition is permitted from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initiated, Self::Pending | Self::Failed)
                | (Self::Pending, Self::Completed | Self::Failed)
        )
    }

    /// Decide what applying terminal status `incoming` to a payment
    /// currently in `self` should do.
    ///
    /// Re-applying the same terminal status is a no-op; a conflicting
    /// terminal status is rejected, never overwritten. Non-terminal
    /// `incoming` values are always a [`TerminalOutcome::Conflict`].
    #[must_use]
    pub const fn apply_terminal(self, incoming: Self) -> TerminalOutcome {
        if !incoming.is_terminal() {
            return TerminalOutcome::Conflict;
        }
        if self.is_terminal() {
            if self as u8 == incoming as u8 {
                TerminalOutcome::AlreadyApplied
            } else {
                TerminalOutcome::Conflict
            }
        } else {
            TerminalOutcome::Applied
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiated => write!(f, "initiated"),
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_happy_path() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn order_terminal_states_are_dead_ends() {
        for terminal in [
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
                OrderStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn order_can_cancel_before_delivery() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Failed));
    }

    #[test]
    fn shipment_forward_only() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Shipped));
        assert!(ShipmentStatus::Shipped.can_transition_to(ShipmentStatus::Delivered));
        // backward
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::Shipped));
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::Shipped.can_transition_to(ShipmentStatus::Pending));
        // skipping pending -> delivered is also invalid
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn shipment_lost_and_returned_only_from_shipped() {
        assert!(ShipmentStatus::Shipped.can_transition_to(ShipmentStatus::Lost));
        assert!(ShipmentStatus::Shipped.can_transition_to(ShipmentStatus::Returned));
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Lost));
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Returned));
    }

    #[test]
    fn payment_dispatch_transitions() {
        assert!(PaymentStatus::Initiated.can_transition_to(PaymentStatus::Pending));
        assert!(PaymentStatus::Initiated.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
        assert!(!PaymentStatus::Initiated.can_transition_to(PaymentStatus::Completed));
    }

    #[test]
    fn payment_terminal_is_idempotent() {
        assert_eq!(
            PaymentStatus::Completed.apply_terminal(PaymentStatus::Completed),
            TerminalOutcome::AlreadyApplied
        );
        assert_eq!(
            PaymentStatus::Failed.apply_terminal(PaymentStatus::Failed),
            TerminalOutcome::AlreadyApplied
        );
    }

    #[test]
    fn payment_terminal_is_one_way() {
        assert_eq!(
            PaymentStatus::Completed.apply_terminal(PaymentStatus::Failed),
            TerminalOutcome::Conflict
        );
        assert_eq!(
            PaymentStatus::Failed.apply_terminal(PaymentStatus::Completed),
            TerminalOutcome::Conflict
        );
    }

    #[test]
    fn payment_terminal_applies_from_non_terminal() {
        assert_eq!(
            PaymentStatus::Pending.apply_terminal(PaymentStatus::Completed),
            TerminalOutcome::Applied
        );
        assert_eq!(
            PaymentStatus::Initiated.apply_terminal(PaymentStatus::Failed),
            TerminalOutcome::Applied
        );
    }

    #[test]
    fn non_terminal_incoming_is_rejected() {
        assert_eq!(
            PaymentStatus::Pending.apply_terminal(PaymentStatus::Pending),
            TerminalOutcome::Conflict
        );
    }

    #[test]
    fn serde_snake_case_wire_format() {
        let json = serde_json::to_string(&ShipmentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let back: PaymentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, PaymentStatus::Completed);
    }
}
