//! Product API handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use mercado_core::{NewProduct, Product, ProductQuery, ProductQueryParams, ProductUpdate};

use super::{ApiResponse, PaginatedResponse, parse_product_id};
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/products` - one page of products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    params: std::result::Result<Query<ProductQueryParams>, QueryRejection>,
) -> Result<PaginatedResponse<Product>> {
    let Query(params) = params?;
    let query = ProductQuery::from_params(&params)?;
    let page = state.catalog().list(&query).await?;

    Ok(PaginatedResponse::new(
        page.items,
        &page.info,
        &query,
        &state.config().base_url,
        "/api/products",
    ))
}

/// `GET /api/products/{pid}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<ApiResponse<Product>> {
    let id = parse_product_id(&pid)?;
    let product = state.catalog().get(id).await?;
    Ok(ApiResponse::success(product))
}

/// `POST /api/products` - create a product and broadcast the catalog.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = body?;
    let product = state.catalog().create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(product).with_message("Product created"),
    ))
}

/// `PUT /api/products/{pid}` - partial update.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    body: std::result::Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<ApiResponse<Product>> {
    let id = parse_product_id(&pid)?;
    let Json(update) = body?;
    let product = state.catalog().update(id, update).await?;
    Ok(ApiResponse::success(product).with_message("Product updated"))
}

/// `DELETE /api/products/{pid}` - returns the deleted product.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<ApiResponse<Product>> {
    let id = parse_product_id(&pid)?;
    let product = state.catalog().delete(id).await?;
    Ok(ApiResponse::success(product).with_message("Product deleted"))
}
