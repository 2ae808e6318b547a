//! Checkout engine: converts an open cart into an immutable order.
//!
//! The whole sequence - stock validation, order and item creation, stock
//! decrement, cart closure - runs in one transaction with row locks on the
//! affected catalog rows, so concurrent checkouts serialize on stock and a
//! failure leaves zero partial rows. Planning itself is a pure function
//! over the locked rows, kept separate so the stock/pricing rules are
//! testable without a database.

use sqlx::PgPool;
use tracing::{info, instrument};

use duka_core::{Amount, PhoneNumber, ProductId, UserId, VariationId};

use crate::db::{self, orders::NewOrderItem};
use crate::error::{AppError, Result};
use crate::models::{CartItem, Order, OrderItem, Product, ProductVariation, Shipment};
use crate::services::events::EventDispatcher;

/// A checkout request, validated at the route boundary.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart_id: duka_core::CartId,
    pub address: String,
    pub phone_number: String,
    pub payment_method: String,
}

/// Everything a successful checkout produced.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipment: Shipment,
}

/// A cart line joined with its locked catalog rows.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub item: CartItem,
    pub product: Product,
    pub variation: Option<ProductVariation>,
}

/// One planned order line. `unit_price` is the checkout-time snapshot.
#[derive(Debug, Clone)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
    pub unit_price: Amount,
}

/// The validated result of planning a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Amount,
}

/// Validate stock and compute prices for every line.
///
/// Prices are re-snapshotted from the catalog rows, not copied from the
/// cart items, and the total is recomputed from those snapshots. The first
/// line that requests more units than the catalog has fails the whole plan.
///
/// # Errors
///
/// Returns [`AppError::InsufficientStock`] naming the offending product,
/// or [`AppError::Validation`] for a variation/product mismatch.
pub fn plan_checkout(lines: &[CheckoutLine]) -> Result<CheckoutPlan> {
    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Amount::ZERO;

    for line in lines {
        let quantity = line.item.quantity;

        let (available, unit_price, label) = match &line.variation {
            Some(variation) => {
                if variation.product_id != line.product.id {
                    return Err(AppError::Validation(format!(
                        "variation {} does not belong to product {}",
                        variation.id, line.product.id
                    )));
                }
                (
                    variation.quantity,
                    variation.price,
                    format!("{} ({}: {})", line.product.name, variation.name, variation.value),
                )
            }
            None => (line.product.quantity, line.product.price, line.product.name.clone()),
        };

        if available < quantity {
            return Err(AppError::InsufficientStock {
                product: label,
                requested: u32::try_from(quantity).unwrap_or(0),
                available: u32::try_from(available).unwrap_or(0),
            });
        }

        total += unit_price.line_total(u32::try_from(quantity).unwrap_or(0));
        planned.push(PlannedLine {
            product_id: line.product.id,
            variation_id: line.variation.as_ref().map(|v| v.id),
            quantity,
            unit_price,
        });
    }

    Ok(CheckoutPlan {
        lines: planned,
        total,
    })
}

/// The checkout engine.
#[derive(Clone)]
pub struct CheckoutService {
    pool: PgPool,
    events: EventDispatcher,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: PgPool, events: EventDispatcher) -> Self {
        Self { pool, events }
    }

    /// Convert the user's cart into an order.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the cart is absent or not the caller's
    /// - [`AppError::AlreadyCheckedOut`] on a second checkout of the cart
    /// - [`AppError::EmptyCart`] if the cart has no items
    /// - [`AppError::InsufficientStock`] if any line exceeds current stock
    /// - [`AppError::Validation`] for a malformed address or phone number
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id, user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(AppError::Validation("address must not be empty".to_owned()));
        }
        let phone = PhoneNumber::parse(&request.phone_number)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let cart = db::carts::lock_for_checkout(&mut tx, request.cart_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart {}", request.cart_id)))?;
        if cart.checked_out {
            return Err(AppError::AlreadyCheckedOut);
        }

        let mut items = db::carts::items_in_tx(&mut tx, cart.id).await?;
        if items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // Deterministic lock order across carts holding the same products.
        items.sort_by_key(|item| (item.product_id.as_i32(), item.variation_id.map(|v| v.as_i32())));

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = db::catalog::lock_product(&mut tx, item.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("product {} missing for cart item", item.product_id))
                })?;
            let variation = match item.variation_id {
                Some(id) => Some(
                    db::catalog::lock_variation(&mut tx, id).await?.ok_or_else(|| {
                        AppError::Internal(format!("variation {id} missing for cart item"))
                    })?,
                ),
                None => None,
            };
            lines.push(CheckoutLine {
                item,
                product,
                variation,
            });
        }

        let plan = plan_checkout(&lines)?;

        let order = db::orders::insert_order(
            &mut tx,
            user_id,
            plan.total,
            address,
            phone.as_str(),
            &request.payment_method,
        )
        .await?;

        let new_items: Vec<NewOrderItem> = plan
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                variation_id: line.variation_id,
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();
        let order_items = db::orders::insert_order_items(&mut tx, order.id, &new_items).await?;

        for line in &plan.lines {
            match line.variation_id {
                Some(variation_id) => {
                    db::catalog::decrement_variation_stock(&mut tx, variation_id, line.quantity)
                        .await?;
                }
                None => {
                    db::catalog::decrement_product_stock(&mut tx, line.product_id, line.quantity)
                        .await?;
                }
            }
        }

        // The order and its pending shipment commit or roll back together,
        // so an order is never observable without one.
        let shipment = db::shipments::insert_for_order(&mut tx, order.id).await?;

        db::carts::mark_checked_out(&mut tx, cart.id).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            shipment_id = %shipment.id,
            total = %order.total_amount,
            "Checkout committed"
        );

        self.events.order_created(&order);

        Ok(CheckoutOutcome {
            order,
            items: order_items,
            shipment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use duka_core::{CartId, CartItemId, CategoryId};
    use rust_decimal::dec;

    fn product(id: i32, price: &str, quantity: i32) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            sku: String::new(),
            brand: String::new(),
            price: Amount::new(price.parse().unwrap()).unwrap(),
            quantity,
            in_stock: quantity > 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variation(id: i32, product_id: i32, price: &str, quantity: i32) -> ProductVariation {
        ProductVariation {
            id: VariationId::new(id),
            product_id: ProductId::new(product_id),
            name: "Color".to_owned(),
            value: "Red".to_owned(),
            sku: String::new(),
            price: Amount::new(price.parse().unwrap()).unwrap(),
            quantity,
            in_stock: quantity > 0,
        }
    }

    fn cart_item(id: i32, product_id: i32, variation_id: Option<i32>, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            product_id: ProductId::new(product_id),
            variation_id: variation_id.map(VariationId::new),
            quantity,
            // Stale cart-time snapshot; the plan must ignore it.
            price: Amount::new(dec!(999.99)).unwrap(),
        }
    }

    #[test]
    fn plans_the_worked_example() {
        // 2 units of product P (stock=5, price=10.00) and 1 unit of
        // variation V (stock=3, price=5.00) total 25.00.
        let lines = vec![
            CheckoutLine {
                item: cart_item(1, 1, None, 2),
                product: product(1, "10.00", 5),
                variation: None,
            },
            CheckoutLine {
                item: cart_item(2, 2, Some(7), 1),
                product: product(2, "99.00", 0),
                variation: Some(variation(7, 2, "5.00", 3)),
            },
        ];

        let plan = plan_checkout(&lines).unwrap();
        assert_eq!(plan.total.as_decimal(), dec!(25.00));
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].unit_price.as_decimal(), dec!(10.00));
        assert_eq!(plan.lines[1].unit_price.as_decimal(), dec!(5.00));
    }

    #[test]
    fn prices_come_from_the_catalog_not_the_cart() {
        let lines = vec![CheckoutLine {
            item: cart_item(1, 1, None, 1),
            product: product(1, "10.00", 5),
            variation: None,
        }];

        let plan = plan_checkout(&lines).unwrap();
        // cart snapshot was 999.99; checkout re-snapshots to 10.00
        assert_eq!(plan.total.as_decimal(), dec!(10.00));
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let lines = vec![CheckoutLine {
            item: cart_item(1, 1, None, 6),
            product: product(1, "10.00", 5),
            variation: None,
        }];

        match plan_checkout(&lines) {
            Err(AppError::InsufficientStock {
                product,
                requested,
                available,
            }) => {
                assert_eq!(product, "Product 1");
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn variation_stock_is_checked_not_product_stock() {
        // Product has plenty; the variation is depleted.
        let lines = vec![CheckoutLine {
            item: cart_item(1, 1, Some(7), 1),
            product: product(1, "10.00", 100),
            variation: Some(variation(7, 1, "5.00", 0)),
        }];

        assert!(matches!(
            plan_checkout(&lines),
            Err(AppError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn one_bad_line_fails_the_whole_plan() {
        let lines = vec![
            CheckoutLine {
                item: cart_item(1, 1, None, 1),
                product: product(1, "10.00", 5),
                variation: None,
            },
            CheckoutLine {
                item: cart_item(2, 2, None, 3),
                product: product(2, "4.00", 2),
                variation: None,
            },
        ];

        assert!(matches!(
            plan_checkout(&lines),
            Err(AppError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn last_unit_goes_to_exactly_one_plan() {
        // Two competing checkouts of the same last unit: the winner's
        // decrement leaves quantity 0, so the loser's plan over the
        // re-locked row must fail.
        let before = vec![CheckoutLine {
            item: cart_item(1, 1, None, 1),
            product: product(1, "10.00", 1),
            variation: None,
        }];
        assert!(plan_checkout(&before).is_ok());

        let after = vec![CheckoutLine {
            item: cart_item(2, 1, None, 1),
            product: product(1, "10.00", 0),
            variation: None,
        }];
        assert!(matches!(
            plan_checkout(&after),
            Err(AppError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn mismatched_variation_is_rejected() {
        let lines = vec![CheckoutLine {
            item: cart_item(1, 1, Some(7), 1),
            product: product(1, "10.00", 5),
            variation: Some(variation(7, 99, "5.00", 3)),
        }];

        assert!(matches!(
            plan_checkout(&lines),
            Err(AppError::Validation(_))
        ));
    }
}
