//! Application logic for CRM Pro.
//!
//! - [`ApiService`]: tenant-scoped CRUD over clients, opportunities, tasks
//!   and interactions, plus dashboard stats and the user profile.
//! - [`AuthService`]: sign-up, sign-in, sessions and password resets.
//! - [`schema`]: form validation into typed inputs.
//! - [`dashboard`], [`filter`], [`display`]: derivations used by the views.

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod filter;
pub mod password;
pub mod schema;

pub use api::ApiService;
pub use auth::{
    AuthConfig, AuthEvent, AuthEventKind, AuthService, AuthSession, AuthSubscription, AuthUser,
    SignInData, SignUpData,
};
pub use dashboard::{is_overdue, ClientSummary, DashboardStats, PipelineSummary, TaskSummary};
pub use error::{ApiError, AuthError, Result};
pub use filter::{ClientFilter, ListFilter, ListQuery, OpportunityFilter, TaskFilter};
pub use schema::Validate;

pub use database::{ValidationError, ValidationErrors};
