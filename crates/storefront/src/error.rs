//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. API handlers return `Result<T, AppError>`; the
//! response body is the JSON error envelope
//! `{"status": "error", "message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use mercado_core::{CartError, IdError, QueryError, ResponseStatus, ValidationError};

use crate::db::RepositoryError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Product input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// List query parameters are invalid.
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    /// Path ID is malformed.
    #[error("Invalid id: {0}")]
    Id(#[from] IdError),

    /// The route exists but not for this HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound | RepositoryError::Cart(CartError::ProductNotInCart(_)) => {
                    StatusCode::NOT_FOUND
                }
                RepositoryError::Conflict(_)
                | RepositoryError::Validation(_)
                | RepositoryError::Cart(CartError::InvalidQuantity) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_)
                | RepositoryError::Io(_)
                | RepositoryError::Serialization(_)
                | RepositoryError::DataCorruption(_)
                | RepositoryError::IdsExhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) | Self::Query(_) | Self::Id(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Whether this error is the server's fault.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to clients.
    ///
    /// Server errors get a generic message; details go to logs and Sentry.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::NotFound(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::Database(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Query(err) => err.to_string(),
            Self::Id(err) => err.to_string(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: ResponseStatus,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            status: ResponseStatus::Error,
            message: self.client_message(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for catalog and cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
