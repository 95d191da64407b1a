//! Application state shared across handlers.

use std::sync::Arc;

use crm_core::{ApiService, AuthService};
use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Sign-in and session handling.
    pub auth: AuthService,
    /// Expected `apikey` header for `/api`.
    pub api_key: Arc<str>,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub secure_cookies: bool,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, auth: AuthService, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            auth,
            api_key: api_key.into(),
            secure_cookies: false,
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Data-access service for the caller holding `token`.
    pub fn api(&self, token: Option<String>) -> ApiService {
        ApiService::new(self.db.clone(), token)
    }
}
