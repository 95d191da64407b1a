//! Web interface and JSON API for CRM Pro.
//!
//! Server-rendered HTML pages (askama) for signed-in users, plus a JSON API
//! under `/api` gated by an API key. All data access goes through
//! [`crm_core::ApiService`] and [`crm_core::AuthService`].

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use crate::config::{Config, ConfigError};
pub use crate::state::AppState;

/// Build the application with request tracing.
pub fn app(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
