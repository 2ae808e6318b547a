//! In-memory row builders for lifecycle tests.

use chrono::Utc;
use rust_decimal::Decimal;

use duka_core::{
    Amount, CartId, CartItemId, CategoryId, OrderId, OrderStatus, PaymentId, PaymentStatus,
    ProductId, UserId, VariationId,
};
use duka_server::models::{CartItem, Order, Payment, Product, ProductVariation};

/// An `Amount` from a literal like `"10.00"`.
///
/// # Panics
///
/// Panics on a malformed or negative literal; fixtures only.
#[must_use]
pub fn amount(s: &str) -> Amount {
    let value: Decimal = s.parse().expect("fixture amount literal");
    Amount::new(value).expect("fixture amount non-negative")
}

/// A product with the given price and stock.
#[must_use]
pub fn product(id: i32, price: &str, quantity: i32) -> Product {
    Product {
        id: ProductId::new(id),
        category_id: CategoryId::new(1),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: String::new(),
        sku: String::new(),
        brand: String::new(),
        price: amount(price),
        quantity,
        in_stock: quantity > 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A variation of `product_id` with the given price and stock.
#[must_use]
pub fn variation(id: i32, product_id: i32, price: &str, quantity: i32) -> ProductVariation {
    ProductVariation {
        id: VariationId::new(id),
        product_id: ProductId::new(product_id),
        name: "Size".to_owned(),
        value: "M".to_owned(),
        sku: String::new(),
        price: amount(price),
        quantity,
        in_stock: quantity > 0,
    }
}

/// A cart line for the given product/variation pair.
///
/// The price snapshot is deliberately wrong (9999.00) so tests that
/// re-price at checkout catch any code path that trusts it.
#[must_use]
pub fn cart_item(id: i32, product_id: i32, variation_id: Option<i32>, quantity: i32) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        cart_id: CartId::new(1),
        product_id: ProductId::new(product_id),
        variation_id: variation_id.map(VariationId::new),
        quantity,
        price: amount("9999.00"),
    }
}

/// An order in the given status.
#[must_use]
pub fn order(id: i32, status: OrderStatus, total: &str) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: UserId::new(1),
        total_amount: amount(total),
        address: "123 Moi Avenue, Nairobi".to_owned(),
        phone_number: "254712345678".to_owned(),
        payment_method: "mpesa".to_owned(),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A payment in the given status.
#[must_use]
pub fn payment(id: i32, status: PaymentStatus, transaction_id: Option<&str>) -> Payment {
    Payment {
        id: PaymentId::new(id),
        user_id: UserId::new(1),
        order_id: Some(OrderId::new(1)),
        phone_number: "254712345678".to_owned(),
        amount: amount("150.00"),
        transaction_id: transaction_id.map(str::to_owned),
        status,
        method: "mpesa".to_owned(),
        description: "Order payment".to_owned(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
