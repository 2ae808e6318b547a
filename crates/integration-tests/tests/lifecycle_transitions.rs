//! Integration tests for the order, shipment and payment state machines.
//!
//! These pin down the full transition matrices the services enforce; the
//! database guards repeat the same rules as predicates, so any edit here
//! that breaks a test would also change wire-visible behavior.

use duka_core::{OrderStatus, PaymentStatus, ShipmentStatus, TerminalOutcome};

// =============================================================================
// Order Status Machine
// =============================================================================

#[test]
fn test_order_happy_path() {
    let path = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];
    for pair in path.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "{} -> {} should be legal",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_order_can_skip_processing() {
    // Cash-on-delivery orders ship without a settled payment.
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
}

#[test]
fn test_order_terminal_states_are_dead_ends() {
    let all = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];
    for terminal in [
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ] {
        assert!(terminal.is_terminal());
        for next in all {
            assert!(
                !terminal.can_transition_to(next),
                "{terminal} -> {next} must be illegal"
            );
        }
    }
}

#[test]
fn test_order_cancel_and_fail_from_any_open_state() {
    for open in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
    ] {
        assert!(open.can_transition_to(OrderStatus::Cancelled));
        assert!(open.can_transition_to(OrderStatus::Failed));
    }
}

#[test]
fn test_order_no_backward_moves() {
    assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
}

// =============================================================================
// Shipment Status Machine
// =============================================================================

#[test]
fn test_shipment_full_matrix() {
    use ShipmentStatus::{Delivered, Lost, Pending, Returned, Shipped};

    let legal = [
        (Pending, Shipped),
        (Shipped, Delivered),
        (Shipped, Lost),
        (Shipped, Returned),
    ];
    let all = [Pending, Shipped, Delivered, Lost, Returned];

    for from in all {
        for to in all {
            let expected = legal.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "{from} -> {to} expected legal={expected}"
            );
        }
    }
}

#[test]
fn test_shipment_cannot_be_lost_before_shipping() {
    // A parcel still in the warehouse cannot go missing in transit.
    assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Lost));
    assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Returned));
}

// =============================================================================
// Payment Status Machine
// =============================================================================

#[test]
fn test_payment_dispatch_edges() {
    assert!(PaymentStatus::Initiated.can_transition_to(PaymentStatus::Pending));
    assert!(PaymentStatus::Initiated.can_transition_to(PaymentStatus::Failed));
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));

    assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Failed));
    assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Completed));
}

#[test]
fn test_terminal_write_applies_once() {
    // Fresh payment: the callback lands.
    assert_eq!(
        PaymentStatus::Pending.apply_terminal(PaymentStatus::Completed),
        TerminalOutcome::Applied
    );
    // Duplicate callback: acknowledged, nothing changes.
    assert_eq!(
        PaymentStatus::Completed.apply_terminal(PaymentStatus::Completed),
        TerminalOutcome::AlreadyApplied
    );
    // Contradicting callback: rejected, never overwritten.
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
fn test_callback_can_beat_the_dispatch_ack() {
    // Daraja occasionally delivers the result callback before the STK
    // push acknowledgement is recorded; an initiated payment must still
    // accept the terminal write.
    assert_eq!(
        PaymentStatus::Initiated.apply_terminal(PaymentStatus::Completed),
        TerminalOutcome::Applied
    );
    assert_eq!(
        PaymentStatus::Initiated.apply_terminal(PaymentStatus::Failed),
        TerminalOutcome::Applied
    );
}

#[test]
fn test_non_terminal_writes_are_rejected() {
    assert_eq!(
        PaymentStatus::Pending.apply_terminal(PaymentStatus::Pending),
        TerminalOutcome::Conflict
    );
    assert_eq!(
        PaymentStatus::Initiated.apply_terminal(PaymentStatus::Initiated),
        TerminalOutcome::Conflict
    );
}

// =============================================================================
// Wire Format
// =============================================================================

#[test]
fn test_statuses_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&OrderStatus::Processing).expect("serializes"),
        "\"processing\""
    );
    assert_eq!(
        serde_json::to_string(&ShipmentStatus::Returned).expect("serializes"),
        "\"returned\""
    );
    assert_eq!(
        serde_json::to_string(&PaymentStatus::Initiated).expect("serializes"),
        "\"initiated\""
    );
}
