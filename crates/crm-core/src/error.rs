//! Error types for the data-access and auth services.

use serde::Serialize;
use thiserror::Error;

/// Errors returned by [`crate::ApiService`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session; raised before any data query is issued.
    #[error("Usuario no autenticado")]
    NotAuthenticated,

    /// Database error, passed through unchanged.
    #[error(transparent)]
    Database(#[from] database::DatabaseError),
}

impl ApiError {
    /// Whether the error is a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Database(e) if e.is_not_found())
    }

    /// Whether the missing row is an `entity` ("Client", "Task", ...).
    pub fn is_missing(&self, entity: &str) -> bool {
        matches!(
            self,
            ApiError::Database(database::DatabaseError::NotFound { entity: missing, .. })
                if *missing == entity
        )
    }

    /// Whether the write conflicts with an existing row.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Database(e) if e.is_already_exists())
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Normalized auth failure: only a user-facing message survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    /// Message used when the cause is not something the user can act on.
    pub const INTERNAL: &'static str = "Error interno del servidor";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(Self::INTERNAL)
    }
}
