//! Seed the database with demo users and catalog data.
//!
//! Idempotent: every insert is keyed on a unique column and skips rows
//! that already exist, so re-running the command is safe.
//!
//! # Environment Variables
//!
//! - `DUKA_DATABASE_URL` - `PostgreSQL` connection string

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use super::{CommandError, connect};

struct DemoProduct {
    name: &'static str,
    slug: &'static str,
    brand: &'static str,
    price: &'static str,
    quantity: i32,
    variations: &'static [(&'static str, &'static str, &'static str, i32)],
}

const DEMO_USERS: &[(&str, &str)] = &[
    ("alice@example.com", "Alice Wanjiku"),
    ("bob@example.com", "Bob Otieno"),
];

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Ceramic Mug",
        slug: "ceramic-mug",
        brand: "Jikoni",
        price: "450.00",
        quantity: 40,
        variations: &[],
    },
    DemoProduct {
        name: "Cotton T-Shirt",
        slug: "cotton-t-shirt",
        brand: "Mitumba Co",
        price: "1200.00",
        quantity: 0,
        variations: &[
            ("Size", "M", "1200.00", 15),
            ("Size", "L", "1200.00", 10),
            ("Size", "XL", "1350.00", 5),
        ],
    },
    DemoProduct {
        name: "Kitenge Tote Bag",
        slug: "kitenge-tote-bag",
        brand: "Jikoni",
        price: "800.00",
        quantity: 25,
        variations: &[],
    },
];

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    for (email, name) in DEMO_USERS {
        sqlx::query("INSERT INTO users (email, name) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING")
            .bind(email)
            .bind(name)
            .execute(&pool)
            .await?;
    }
    info!(users = DEMO_USERS.len(), "Seeded users");

    let category_id = seed_category(&pool).await?;

    for product in DEMO_PRODUCTS {
        seed_product(&pool, category_id, product).await?;
    }
    info!(products = DEMO_PRODUCTS.len(), "Seeded catalog");

    Ok(())
}

async fn seed_category(pool: &PgPool) -> Result<i32, CommandError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO categories (name, slug, description)
        VALUES ('General', 'general', 'Demo catalog')
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_product(
    pool: &PgPool,
    category_id: i32,
    product: &DemoProduct,
) -> Result<(), CommandError> {
    let price: Decimal = product.price.parse().unwrap_or_default();

    let (product_id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO products (category_id, name, slug, brand, price, quantity, in_stock)
        VALUES ($1, $2, $3, $4, $5, $6, $6 > 0 OR $7)
        ON CONFLICT (slug) DO UPDATE SET updated_at = now()
        RETURNING id
        ",
    )
    .bind(category_id)
    .bind(product.name)
    .bind(product.slug)
    .bind(product.brand)
    .bind(price)
    .bind(product.quantity)
    .bind(!product.variations.is_empty())
    .fetch_one(pool)
    .await?;

    for (name, value, var_price, quantity) in product.variations {
        let var_price: Decimal = var_price.parse().unwrap_or_default();
        sqlx::query(
            r"
            INSERT INTO product_variations (product_id, name, value, price, quantity, in_stock)
            VALUES ($1, $2, $3, $4, $5, $5 > 0)
            ON CONFLICT (product_id, name, value) DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(name)
        .bind(value)
        .bind(var_price)
        .bind(quantity)
        .execute(pool)
        .await?;
    }

    Ok(())
}
