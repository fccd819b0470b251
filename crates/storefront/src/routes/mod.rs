//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Pages
//! GET  /                       - Home page (static product list)
//! GET  /realtimeproducts       - Product list kept current over /ws
//! GET  /products               - Paginated product listing
//! GET  /products/{pid}         - Product detail
//! GET  /carts/{cid}            - Cart with totals
//!
//! # Realtime
//! GET  /ws                     - WebSocket product snapshots
//!
//! # Products API
//! GET    /api/products         - Paginated list (limit, page, sort, query)
//! POST   /api/products         - Create
//! GET    /api/products/{pid}   - Fetch one
//! PUT    /api/products/{pid}   - Partial update
//! DELETE /api/products/{pid}   - Delete
//!
//! # Carts API
//! GET    /api/carts                       - List carts
//! POST   /api/carts                       - Create empty cart
//! GET    /api/carts/{cid}                 - Cart with product details
//! PUT    /api/carts/{cid}                 - Replace lines
//! DELETE /api/carts/{cid}                 - Empty the cart
//! POST   /api/carts/{cid}/products/{pid}  - Add one unit
//! PUT    /api/carts/{cid}/products/{pid}  - Set quantity
//! DELETE /api/carts/{cid}/products/{pid}  - Remove line
//! POST   /api/carts/{cid}/product/{pid}   - Add one unit (singular alias)
//!
//! Unknown /api paths answer 404 and wrong methods 405, both as JSON.
//! ```

pub mod api;
pub mod cart;
pub mod home;
pub mod products;
pub mod ws;

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, http::StatusCode, routing::get};

use crate::filters;
use crate::state::AppState;

/// Create the product page routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{pid}", get(products::show))
}

/// Create the cart page routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/{cid}", get(cart::show))
}

/// Build the complete router for all pages, the API, and the socket.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/realtimeproducts", get(home::realtime_products))
        .route("/ws", get(ws::handler))
        .nest("/products", product_routes())
        .nest("/carts", cart_routes())
        .nest("/api", api::api_routes())
}

/// Error page template for 404 and 500 responses.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl ErrorTemplate {
    /// A 404 page.
    #[must_use]
    pub fn not_found(message: &str) -> (StatusCode, Self) {
        Self::with_status(StatusCode::NOT_FOUND, "Not found", message)
    }

    /// A 500 page.
    #[must_use]
    pub fn internal(message: &str) -> (StatusCode, Self) {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong", message)
    }

    fn with_status(status: StatusCode, title: &str, message: &str) -> (StatusCode, Self) {
        (
            status,
            Self {
                status: status.as_u16(),
                title: title.to_string(),
                message: message.to_string(),
            },
        )
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> (StatusCode, ErrorTemplate) {
    ErrorTemplate::not_found("The page you are looking for does not exist")
}
