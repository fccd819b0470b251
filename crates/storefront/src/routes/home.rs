//! Home and realtime product list handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::products::ProductView;
use crate::filters;
use crate::state::AppState;

/// Home page template: the full catalog as a static list.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub error: Option<String>,
}

/// Realtime product list template; `realtime.js` keeps it current over `/ws`.
#[derive(Template, WebTemplate)]
#[template(path = "realtime_products.html")]
pub struct RealtimeProductsTemplate {
    pub products: Vec<ProductView>,
    pub error: Option<String>,
}

/// Load every product for a list page, or an error banner message.
async fn load_products(state: &AppState) -> Result<Vec<ProductView>, String> {
    state
        .catalog()
        .list_all()
        .await
        .map(|products| products.iter().map(ProductView::from).collect())
        .map_err(|e| {
            tracing::error!("Failed to load products: {e}");
            "Could not load products".to_string()
        })
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Response {
    match load_products(&state).await {
        Ok(products) => HomeTemplate {
            products,
            error: None,
        }
        .into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            HomeTemplate {
                products: Vec::new(),
                error: Some(message),
            },
        )
            .into_response(),
    }
}

/// Display the realtime product list.
#[instrument(skip(state))]
pub async fn realtime_products(State(state): State<AppState>) -> Response {
    match load_products(&state).await {
        Ok(products) => RealtimeProductsTemplate {
            products,
            error: None,
        }
        .into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            RealtimeProductsTemplate {
                products: Vec::new(),
                error: Some(message),
            },
        )
            .into_response(),
    }
}
