//! Cart route handlers.
//!
//! The cart is lazy: `GET /cart` on a user with no open cart answers with
//! `null` without creating a row; the first item add creates one.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use duka_core::{Amount, CartItemId, ProductId, VariationId};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Cart, CartItem, cart_total};
use crate::state::AppState;

/// A cart with its items and derived total.
#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub total: Amount,
}

impl CartView {
    fn assemble(cart: Cart, items: Vec<CartItem>) -> Self {
        let total = cart_total(&items);
        Self { cart, items, total }
    }
}

/// `GET /cart`: the caller's open cart with items and total, or `null`.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Option<CartView>>> {
    let Some(cart) = db::carts::open_cart(state.pool(), user_id).await? else {
        return Ok(Json(None));
    };
    let items = db::carts::items(state.pool(), cart.id).await?;
    Ok(Json(Some(CartView::assemble(cart, items))))
}

/// Payload for `POST /cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
}

/// `POST /cart/items`: add an item, creating the open cart if needed.
///
/// Merges with an existing line for the same (product, variation) pair by
/// summing quantities; the price snapshot is taken on first add.
#[instrument(skip(state, request))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    if request.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }
    if !db::users::exists(state.pool(), user_id).await? {
        return Err(AppError::Unauthorized(format!("unknown user {user_id}")));
    }

    let product = db::catalog::get_product(state.pool(), request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    // Snapshot the price now; later catalog edits do not move cart lines.
    let price = match request.variation_id {
        Some(variation_id) => {
            db::catalog::get_variation_of(state.pool(), variation_id, product.id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "variation {variation_id} of product {}",
                        product.id
                    ))
                })?
                .price
        }
        None => product.price,
    };

    let cart = db::carts::get_or_create_open_cart(state.pool(), user_id).await?;
    let item = db::carts::upsert_item(
        state.pool(),
        cart.id,
        product.id,
        request.variation_id,
        request.quantity,
        price,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Payload for `PATCH /cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// `PATCH /cart/items/{id}`: set a line's quantity.
///
/// A quantity of zero removes the line, same as a DELETE.
#[instrument(skip(state, request))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Option<CartItem>>> {
    if request.quantity < 0 {
        return Err(AppError::Validation(
            "quantity must not be negative".to_owned(),
        ));
    }

    let item = db::carts::item_in_open_cart(state.pool(), item_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

    if request.quantity == 0 {
        db::carts::delete_item(state.pool(), &item).await?;
        return Ok(Json(None));
    }

    let updated = db::carts::set_item_quantity(state.pool(), item.id, request.quantity).await?;
    Ok(Json(Some(updated)))
}

/// `DELETE /cart/items/{id}`: remove a line.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<CartItemId>,
) -> Result<StatusCode> {
    let item = db::carts::item_in_open_cart(state.pool(), item_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

    db::carts::delete_item(state.pool(), &item).await?;
    Ok(StatusCode::NO_CONTENT)
}
