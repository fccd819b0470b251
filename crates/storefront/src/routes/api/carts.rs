//! Cart API handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use mercado_core::{Cart, CartLine};

use super::{ApiResponse, parse_cart_id, parse_product_id};
use crate::error::Result;
use crate::services::PopulatedCart;
use crate::state::AppState;

/// Body of `PUT /api/carts/{cid}`.
#[derive(Debug, Deserialize)]
pub struct ReplaceProductsBody {
    pub products: Vec<CartLine>,
}

/// Body of `PUT /api/carts/{cid}/products/{pid}`.
#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: u32,
}

/// `GET /api/carts`
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Cart>>> {
    Ok(ApiResponse::success(state.carts().list().await?))
}

/// `POST /api/carts` - create an empty cart.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cart = state.carts().create().await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(cart).with_message("Cart created"),
    ))
}

/// `GET /api/carts/{cid}` - cart with product details.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<ApiResponse<PopulatedCart>> {
    let id = parse_cart_id(&cid)?;
    Ok(ApiResponse::success(state.carts().get_populated(id).await?))
}

/// `PUT /api/carts/{cid}` - replace every line.
#[instrument(skip(state, body))]
pub async fn replace(
    State(state): State<AppState>,
    Path(cid): Path<String>,
    body: std::result::Result<Json<ReplaceProductsBody>, JsonRejection>,
) -> Result<ApiResponse<Cart>> {
    let id = parse_cart_id(&cid)?;
    let Json(body) = body?;
    let cart = state.carts().replace_products(id, body.products).await?;
    Ok(ApiResponse::success(cart).with_message("Cart updated"))
}

/// `DELETE /api/carts/{cid}` - remove every line, keeping the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<ApiResponse<Cart>> {
    let id = parse_cart_id(&cid)?;
    let cart = state.carts().clear(id).await?;
    Ok(ApiResponse::success(cart).with_message("Cart emptied"))
}

/// `POST /api/carts/{cid}/products/{pid}` - add one unit.
#[instrument(skip(state))]
pub async fn add_product(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
) -> Result<ApiResponse<Cart>> {
    let id = parse_cart_id(&cid)?;
    let product = parse_product_id(&pid)?;
    let cart = state.carts().add_product(id, product).await?;
    Ok(ApiResponse::success(cart).with_message("Product added to cart"))
}

/// `PUT /api/carts/{cid}/products/{pid}` - set a line's quantity.
#[instrument(skip(state, body))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
    body: std::result::Result<Json<QuantityBody>, JsonRejection>,
) -> Result<ApiResponse<Cart>> {
    let id = parse_cart_id(&cid)?;
    let product = parse_product_id(&pid)?;
    let Json(body) = body?;
    let cart = state
        .carts()
        .set_quantity(id, product, body.quantity)
        .await?;
    Ok(ApiResponse::success(cart).with_message("Quantity updated"))
}

/// `DELETE /api/carts/{cid}/products/{pid}` - remove a line.
#[instrument(skip(state))]
pub async fn remove_product(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
) -> Result<ApiResponse<Cart>> {
    let id = parse_cart_id(&cid)?;
    let product = parse_product_id(&pid)?;
    let cart = state.carts().remove_product(id, product).await?;
    Ok(ApiResponse::success(cart).with_message("Product removed from cart"))
}
