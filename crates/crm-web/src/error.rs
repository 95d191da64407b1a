//! Error types for the web interface.
//!
//! [`WebError`] answers JSON API requests with `{"error": message}`.
//! [`PageError`] answers HTML requests with a redirect or an error page.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use crm_core::{ApiError, AuthError, ValidationErrors};
use thiserror::Error;

use crate::session::SIGN_IN_PATH;

const INTERNAL_MESSAGE: &str = "Error interno del servidor";

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum WebError {
    /// Missing or wrong `apikey` header.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Data-access failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Auth failure, already normalized.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Input rejected before reaching the database.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            WebError::Api(ApiError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            WebError::Api(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            WebError::Api(e) if e.is_conflict() => StatusCode::CONFLICT,
            WebError::Api(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Auth(e) if e.message == AuthError::INTERNAL => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebError::Auth(_) => StatusCode::UNAUTHORIZED,
            WebError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            WebError::Validation(errors) => {
                let fields: serde_json::Map<String, serde_json::Value> = errors
                    .iter()
                    .map(|e| (e.field().to_string(), e.to_string().into()))
                    .collect();
                serde_json::json!({ "error": self.to_string(), "fields": fields })
            }
            WebError::Api(e) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Database error: {}", e);
                serde_json::json!({ "error": INTERNAL_MESSAGE })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for JSON API handlers.
pub type Result<T> = std::result::Result<T, WebError>;

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

/// Errors of HTML page handlers.
#[derive(Debug, Error)]
pub enum PageError {
    /// No valid session.
    #[error("Usuario no autenticado")]
    Unauthenticated,

    /// The requested record does not exist for this user.
    #[error("No encontrado")]
    NotFound,

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotAuthenticated => PageError::Unauthenticated,
            e if e.is_not_found() => PageError::NotFound,
            e => PageError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PageError::Unauthenticated => return Redirect::to(SIGN_IN_PATH).into_response(),
            PageError::NotFound => (StatusCode::NOT_FOUND, "La página solicitada no existe"),
            PageError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        };

        let page = ErrorTemplate {
            status: status.as_u16(),
            message: message.to_string(),
        };
        (status, page).into_response()
    }
}

/// Result type for HTML page handlers.
pub type PageResult<T> = std::result::Result<T, PageError>;
