//! Integration tests for checkout planning.
//!
//! These exercise the pure planning step over in-memory catalog rows:
//! stock validation, checkout-time re-pricing, and all-or-nothing failure.

use duka_integration_tests::fixtures::{amount, cart_item, product, variation};
use duka_server::error::AppError;
use duka_server::services::checkout::{CheckoutLine, plan_checkout};

// =============================================================================
// Pricing
// =============================================================================

#[test]
fn test_mixed_cart_totals_from_catalog_prices() {
    // 2 x 10.00 (plain product) + 1 x 5.00 (variation) = 25.00
    let lines = vec![
        CheckoutLine {
            item: cart_item(1, 1, None, 2),
            product: product(1, "10.00", 5),
            variation: None,
        },
        CheckoutLine {
            item: cart_item(2, 2, Some(7), 1),
            product: product(2, "80.00", 0),
            variation: Some(variation(7, 2, "5.00", 3)),
        },
    ];

    let plan = plan_checkout(&lines).expect("plan succeeds");
    assert_eq!(plan.total, amount("25.00"));
}

#[test]
fn test_stale_cart_snapshot_is_ignored() {
    // The fixture cart line carries a 9999.00 snapshot; the plan must
    // price from the catalog row instead.
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, None, 3),
        product: product(1, "12.50", 10),
        variation: None,
    }];

    let plan = plan_checkout(&lines).expect("plan succeeds");
    assert_eq!(plan.total, amount("37.50"));
    assert_eq!(plan.lines[0].unit_price, amount("12.50"));
}

#[test]
fn test_variation_price_overrides_product_price() {
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, Some(9), 2),
        product: product(1, "100.00", 50),
        variation: Some(variation(9, 1, "110.00", 4)),
    }];

    let plan = plan_checkout(&lines).expect("plan succeeds");
    assert_eq!(plan.total, amount("220.00"));
}

// =============================================================================
// Stock Validation
// =============================================================================

#[test]
fn test_overselling_fails_the_plan() {
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, None, 6),
        product: product(1, "10.00", 5),
        variation: None,
    }];

    match plan_checkout(&lines) {
        Err(AppError::InsufficientStock {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, 6);
            assert_eq!(available, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
}

#[test]
fn test_variation_stock_governs_variation_lines() {
    // Plenty of product-level stock cannot cover a depleted variation.
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, Some(7), 2),
        product: product(1, "10.00", 100),
        variation: Some(variation(7, 1, "10.00", 1)),
    }];

    assert!(matches!(
        plan_checkout(&lines),
        Err(AppError::InsufficientStock { .. })
    ));
}

#[test]
fn test_plan_is_all_or_nothing() {
    // The valid first line does not survive the invalid second one.
    let lines = vec![
        CheckoutLine {
            item: cart_item(1, 1, None, 1),
            product: product(1, "10.00", 5),
            variation: None,
        },
        CheckoutLine {
            item: cart_item(2, 2, None, 4),
            product: product(2, "3.00", 2),
            variation: None,
        },
    ];

    assert!(plan_checkout(&lines).is_err());
}

#[test]
fn test_exact_stock_is_sellable() {
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, None, 5),
        product: product(1, "10.00", 5),
        variation: None,
    }];

    let plan = plan_checkout(&lines).expect("buying out the stock is fine");
    assert_eq!(plan.total, amount("50.00"));
}

// =============================================================================
// Contention (planning view of two competing checkouts)
// =============================================================================

#[test]
fn test_last_unit_goes_to_one_buyer() {
    // The first checkout plans against quantity 1 and wins; the second
    // re-locks the row after the decrement and must fail.
    let winner = vec![CheckoutLine {
        item: cart_item(1, 1, None, 1),
        product: product(1, "10.00", 1),
        variation: None,
    }];
    assert!(plan_checkout(&winner).is_ok());

    let loser = vec![CheckoutLine {
        item: cart_item(2, 1, None, 1),
        product: product(1, "10.00", 0),
        variation: None,
    }];
    assert!(matches!(
        plan_checkout(&loser),
        Err(AppError::InsufficientStock { .. })
    ));
}

// =============================================================================
// Line Integrity
// =============================================================================

#[test]
fn test_foreign_variation_is_rejected() {
    let lines = vec![CheckoutLine {
        item: cart_item(1, 1, Some(7), 1),
        product: product(1, "10.00", 5),
        variation: Some(variation(7, 2, "5.00", 3)),
    }];

    assert!(matches!(
        plan_checkout(&lines),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_empty_line_set_plans_to_zero() {
    // The service rejects empty carts before planning; the planner itself
    // is total over the empty slice.
    let plan = plan_checkout(&[]).expect("empty plan");
    assert_eq!(plan.total, amount("0.00"));
    assert!(plan.lines.is_empty());
}
