//! Product page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use mercado_core::{Product, ProductId, ProductQuery, ProductQueryParams};

use super::ErrorTemplate;
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub code: String,
    pub price: String,
    pub stock: u32,
    pub category: String,
    pub availability: String,
    pub in_stock: bool,
    pub thumbnail: Option<String>,
    pub thumbnails: Vec<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            description: product.description.clone(),
            code: product.code.to_string(),
            price: product.price.display(),
            stock: product.stock,
            category: product.category.clone(),
            availability: product.availability().label().to_string(),
            in_stock: product.status && product.stock > 0,
            thumbnail: product.thumbnails.first().cloned(),
            thumbnails: product.thumbnails.clone(),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
    pub sort: String,
    pub query: String,
    pub error: Option<String>,
}

impl ProductsIndexTemplate {
    fn failed(params: &ProductQueryParams, message: String) -> Self {
        Self {
            products: Vec::new(),
            current_page: 1,
            total_pages: 1,
            prev_link: None,
            next_link: None,
            sort: params.sort.clone().unwrap_or_default(),
            query: params.query.clone().unwrap_or_default(),
            error: Some(message),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Display the paginated product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProductQueryParams>,
) -> Response {
    let query = match ProductQuery::from_params(&params) {
        Ok(query) => query,
        Err(e) => {
            let page = ProductsIndexTemplate::failed(&params, e.to_string());
            return (StatusCode::BAD_REQUEST, page).into_response();
        }
    };

    match state.catalog().list(&query).await {
        Ok(page) => ProductsIndexTemplate {
            products: page.items.iter().map(ProductView::from).collect(),
            current_page: page.info.page,
            total_pages: page.info.total_pages,
            prev_link: page.info.prev_page.map(|p| query.link_for("/products", p)),
            next_link: page.info.next_page.map(|p| query.link_for("/products", p)),
            sort: query.sort.map(|s| s.as_str().to_string()).unwrap_or_default(),
            query: query
                .filter
                .as_ref()
                .map(|f| f.as_query_value().to_string())
                .unwrap_or_default(),
            error: None,
        }
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load products: {e}");
            let page = ProductsIndexTemplate::failed(&params, "Could not load products".to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}

/// Display a product detail page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(pid): Path<String>) -> Response {
    let Ok(id) = pid.parse::<ProductId>() else {
        return ErrorTemplate::not_found("Product not found").into_response();
    };

    match state.catalog().get(id).await {
        Ok(product) => ProductShowTemplate {
            product: ProductView::from(&product),
        }
        .into_response(),
        Err(AppError::NotFound(_)) => ErrorTemplate::not_found("Product not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to load product {id}: {e}");
            ErrorTemplate::internal("Could not load this product").into_response()
        }
    }
}
