//! JSON REST API.
//!
//! Every response uses the envelope
//! `{"status": "success", "payload": ..., "message"?: ...}` or, on failure,
//! `{"status": "error", "message": ...}` (see [`crate::error::AppError`]).

pub mod carts;
pub mod products;

use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use url::Url;

use mercado_core::{CartId, PageInfo, ProductId, ProductQuery, ResponseStatus};

use crate::error::AppError;
use crate::state::AppState;

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{pid}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/carts", get(carts::index).post(carts::create))
        .route(
            "/carts/{cid}",
            get(carts::show).put(carts::replace).delete(carts::clear),
        )
        .route(
            "/carts/{cid}/products/{pid}",
            post(carts::add_product)
                .put(carts::set_quantity)
                .delete(carts::remove_product),
        )
        // Singular form kept for older clients
        .route("/carts/{cid}/product/{pid}", post(carts::add_product))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}

/// JSON 404 for unknown `/api` paths.
async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// JSON 405 for known paths hit with the wrong method.
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub payload: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload.
    pub const fn success(payload: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload,
            message: None,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Success envelope for a page of results, with navigation metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub status: ResponseStatus,
    pub payload: Vec<T>,
    pub total_pages: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub page: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// Build the response, linking neighbouring pages under `base_url`.
    pub fn new(
        payload: Vec<T>,
        info: &PageInfo,
        query: &ProductQuery,
        base_url: &Url,
        path: &str,
    ) -> Self {
        let link = |page: u32| absolute_link(base_url, &query.link_for(path, page));

        Self {
            status: ResponseStatus::Success,
            payload,
            total_pages: info.total_pages,
            prev_page: info.prev_page,
            next_page: info.next_page,
            page: info.page,
            has_prev_page: info.has_prev_page,
            has_next_page: info.has_next_page,
            prev_link: info.prev_page.map(&link),
            next_link: info.next_page.map(&link),
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Resolve a root-relative link against the public base URL.
fn absolute_link(base_url: &Url, relative: &str) -> String {
    base_url
        .join(relative)
        .map_or_else(|_| relative.to_string(), String::from)
}

/// Parse a `{pid}` path segment.
///
/// # Errors
///
/// Returns `AppError::Id` if the segment is not a positive integer.
pub fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    Ok(raw.parse()?)
}

/// Parse a `{cid}` path segment.
///
/// # Errors
///
/// Returns `AppError::Id` if the segment is not a positive integer.
pub fn parse_cart_id(raw: &str) -> Result<CartId, AppError> {
    Ok(raw.parse()?)
}
