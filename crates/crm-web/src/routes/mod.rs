//! Route handlers for the web interface.

pub mod api;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod opportunities;
pub mod profile;
pub mod tasks;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use crm_core::ApiError;
use tracing::{error, warn};

use crate::error::PageError;
use crate::state::AppState;
use crate::views::FormErrors;

/// Inline message for a failed save.
const SAVE_FAILED: &str = "No se pudo guardar. Inténtalo de nuevo.";

/// Inline message when a selected client or opportunity is gone.
const MISSING_REFERENCE: &str = "El cliente u oportunidad seleccionado ya no existe.";

/// Turn a failed form submission into an inline message. An expired
/// session still redirects to sign-in.
pub(crate) fn save_failed(err: ApiError) -> Result<FormErrors, PageError> {
    match err {
        ApiError::NotAuthenticated => Err(PageError::Unauthenticated),
        e if e.is_not_found() => {
            warn!(error = %e, "Form references a missing record");
            Ok(FormErrors::general(MISSING_REFERENCE))
        }
        e => {
            error!(error = %e, "Form submission failed");
            Ok(FormErrors::general(SAVE_FAILED))
        }
    }
}

/// Log the failure of a fire-and-forget action.
pub(crate) fn ignore_failure<T>(result: Result<T, ApiError>, action: &str) {
    if let Err(e) = result {
        warn!(error = %e, action, "Action failed");
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/signup", post(api::sign_up))
        .route("/auth/signin", post(api::sign_in))
        .route("/auth/signout", post(api::sign_out))
        .route("/auth/user", get(api::current_user))
        .route("/auth/reset-password", post(api::request_password_reset))
        .route("/auth/reset-password/confirm", post(api::reset_password))
        .route("/stats", get(api::stats))
        .route("/clients", get(api::list_clients).post(api::create_client))
        .route(
            "/clients/:id",
            get(api::get_client)
                .patch(api::update_client)
                .delete(api::delete_client),
        )
        .route(
            "/opportunities",
            get(api::list_opportunities).post(api::create_opportunity),
        )
        .route(
            "/opportunities/:id",
            get(api::get_opportunity)
                .patch(api::update_opportunity)
                .delete(api::delete_opportunity),
        )
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/tasks/:id",
            get(api::get_task)
                .patch(api::update_task)
                .delete(api::delete_task),
        )
        .route(
            "/interactions",
            get(api::list_interactions).post(api::create_interaction),
        )
        .route(
            "/interactions/:id",
            axum::routing::patch(api::update_interaction).delete(api::delete_interaction),
        )
        .route("/profile", get(api::get_profile).patch(api::update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_api_key,
        ));

    Router::new()
        // HTML pages
        .route("/", get(auth::root))
        .route("/auth/signin", get(auth::sign_in_page).post(auth::sign_in))
        .route("/auth/signup", get(auth::sign_up_page).post(auth::sign_up))
        .route("/auth/signout", post(auth::sign_out))
        .route(
            "/auth/reset-password",
            get(auth::reset_request_page).post(auth::reset_request),
        )
        .route(
            "/auth/reset-password/confirm",
            get(auth::reset_confirm_page).post(auth::reset_confirm),
        )
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/dashboard/clients", get(clients::list_page))
        .route(
            "/dashboard/clients/new",
            get(clients::new_page).post(clients::create),
        )
        .route("/dashboard/clients/:id", get(clients::detail_page))
        .route(
            "/dashboard/clients/:id/edit",
            get(clients::edit_page).post(clients::update),
        )
        .route("/dashboard/clients/:id/delete", post(clients::delete))
        .route(
            "/dashboard/clients/:id/interactions",
            post(clients::create_interaction),
        )
        .route(
            "/dashboard/clients/:id/interactions/:interaction_id/delete",
            post(clients::delete_interaction),
        )
        .route("/dashboard/opportunities", get(opportunities::list_page))
        .route(
            "/dashboard/opportunities/new",
            get(opportunities::new_page).post(opportunities::create),
        )
        .route(
            "/dashboard/opportunities/:id/edit",
            get(opportunities::edit_page).post(opportunities::update),
        )
        .route(
            "/dashboard/opportunities/:id/delete",
            post(opportunities::delete),
        )
        .route("/dashboard/tasks", get(tasks::list_page))
        .route(
            "/dashboard/tasks/new",
            get(tasks::new_page).post(tasks::create),
        )
        .route(
            "/dashboard/tasks/:id/edit",
            get(tasks::edit_page).post(tasks::update),
        )
        .route("/dashboard/tasks/:id/status", post(tasks::set_status))
        .route("/dashboard/tasks/:id/delete", post(tasks::delete))
        .route(
            "/dashboard/profile",
            get(profile::profile_page).post(profile::update),
        )
        // Health check
        .route("/health", get(health::health))
        // JSON API
        .nest("/api", api)
        .with_state(state)
}
