//! Cart page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use mercado_core::CartId;

use crate::error::AppError;
use crate::filters;
use crate::services::{PopulatedCart, PopulatedLine};
use crate::state::AppState;

use super::ErrorTemplate;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub title: String,
    pub code: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&PopulatedLine> for CartItemView {
    fn from(line: &PopulatedLine) -> Self {
        Self {
            product_id: line.product.id.to_string(),
            title: line.product.title.clone(),
            code: line.product.code.to_string(),
            quantity: line.quantity,
            price: line.product.price.display(),
            line_price: line.subtotal.display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub id: String,
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&PopulatedCart> for CartView {
    fn from(cart: &PopulatedCart) -> Self {
        Self {
            id: cart.id.to_string(),
            items: cart.products.iter().map(CartItemView::from).collect(),
            total: cart.total.display(),
            item_count: cart.item_count(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "carts/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Display a cart with product details and totals.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(cid): Path<String>) -> Response {
    let Ok(id) = cid.parse::<CartId>() else {
        return ErrorTemplate::not_found("Cart not found").into_response();
    };

    match state.carts().get_populated(id).await {
        Ok(cart) => CartShowTemplate {
            cart: CartView::from(&cart),
        }
        .into_response(),
        Err(AppError::NotFound(_)) => ErrorTemplate::not_found("Cart not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to load cart {id}: {e}");
            ErrorTemplate::internal("Could not load this cart").into_response()
        }
    }
}
