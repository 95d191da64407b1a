//! JSON API under `/api`.
//!
//! Every request must carry the configured key in the `apikey` header. The
//! caller is identified by `Authorization: Bearer <token>` or the session
//! cookie.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crm_core::password::constant_time_eq;
use crm_core::schema::{ResetConfirmForm, ResetRequestForm, SignInForm, SignUpForm};
use crm_core::{AuthSession, AuthUser, DashboardStats, Validate};
use database::{
    Account, Client, ClientUpdate, Interaction, InteractionUpdate, NewClient, NewInteraction,
    NewOpportunity, NewTask, Opportunity, OpportunityUpdate, ProfileUpdate, Task, TaskUpdate,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, WebError};
use crate::session::Caller;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "apikey";

/// Reject requests without the configured API key.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let valid = provided.map_or(false, |key| {
        constant_time_eq(key.as_bytes(), state.api_key.as_bytes())
    });
    if !valid {
        warn!(path = %request.uri().path(), "Rejected API request without valid key");
        return WebError::InvalidApiKey.into_response();
    }

    next.run(request).await
}

/// Unwrap a JSON body, reporting malformed input as `{"error": ...}`.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| WebError::BadRequest(e.body_text()))
}

fn validated<T: Validate>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    let value = body(payload)?;
    value.validate()?;
    Ok(value)
}

// Auth

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Option<AuthUser>,
}

pub async fn sign_up(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let request = body(payload)?;
    let form = SignUpForm {
        email: request.email,
        confirm_password: request.password.clone(),
        password: request.password,
        full_name: request.full_name,
    };
    let data = form.validate()?;
    let session = state.auth.sign_up(data).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignInForm>, JsonRejection>,
) -> Result<Json<AuthSession>> {
    let data = body(payload)?.validate()?;
    Ok(Json(state.auth.sign_in(data).await?))
}

pub async fn sign_out(State(state): State<AppState>, Caller(token): Caller) -> Result<StatusCode> {
    if let Some(token) = token {
        state.auth.sign_out(&token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user(State(state): State<AppState>, Caller(token): Caller) -> Json<UserResponse> {
    let user = match token {
        Some(token) => state.auth.get_current_user(&token).await,
        None => None,
    };
    Json(UserResponse { user })
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetRequestForm>, JsonRejection>,
) -> Result<StatusCode> {
    let email = body(payload)?.validate()?;
    state.auth.request_password_reset(&email).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reset_password(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetConfirmForm>, JsonRejection>,
) -> Result<StatusCode> {
    let form = body(payload)?;
    let password = form.validate()?;
    state.auth.reset_password(&form.token, &password).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Dashboard

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub conversion_rate: u32,
}

pub async fn stats(State(state): State<AppState>, Caller(token): Caller) -> Result<Json<StatsResponse>> {
    let stats = state.api(token).get_dashboard_stats().await?;
    Ok(Json(StatsResponse {
        conversion_rate: stats.conversion_rate(),
        stats,
    }))
}

// Clients

pub async fn list_clients(State(state): State<AppState>, Caller(token): Caller) -> Result<Json<Vec<Client>>> {
    Ok(Json(state.api(token).get_clients().await?))
}

pub async fn get_client(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<Json<Client>> {
    Ok(Json(state.api(token).get_client(&id).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    Caller(token): Caller,
    payload: std::result::Result<Json<NewClient>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>)> {
    let new = validated(payload)?;
    let client = state.api(token).create_client(new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ClientUpdate>, JsonRejection>,
) -> Result<Json<Client>> {
    let update = validated(payload)?;
    Ok(Json(state.api(token).update_client(&id, update).await?))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.api(token).delete_client(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Opportunities

pub async fn list_opportunities(
    State(state): State<AppState>,
    Caller(token): Caller,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(state.api(token).get_opportunities().await?))
}

pub async fn get_opportunity(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<Json<Opportunity>> {
    Ok(Json(state.api(token).get_opportunity(&id).await?))
}

pub async fn create_opportunity(
    State(state): State<AppState>,
    Caller(token): Caller,
    payload: std::result::Result<Json<NewOpportunity>, JsonRejection>,
) -> Result<(StatusCode, Json<Opportunity>)> {
    let new = validated(payload)?;
    let opportunity = state.api(token).create_opportunity(new).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

pub async fn update_opportunity(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<OpportunityUpdate>, JsonRejection>,
) -> Result<Json<Opportunity>> {
    let update = validated(payload)?;
    Ok(Json(state.api(token).update_opportunity(&id, update).await?))
}

pub async fn delete_opportunity(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.api(token).delete_opportunity(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Tasks

pub async fn list_tasks(State(state): State<AppState>, Caller(token): Caller) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.api(token).get_tasks().await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    Ok(Json(state.api(token).get_task(&id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Caller(token): Caller,
    payload: std::result::Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>)> {
    let new = validated(payload)?;
    let task = state.api(token).create_task(new).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<Task>> {
    let update = validated(payload)?;
    Ok(Json(state.api(token).update_task(&id, update).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.api(token).delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Interactions

#[derive(Debug, Default, Deserialize)]
pub struct InteractionQuery {
    pub client_id: Option<String>,
}

pub async fn list_interactions(
    State(state): State<AppState>,
    Caller(token): Caller,
    Query(query): Query<InteractionQuery>,
) -> Result<Json<Vec<Interaction>>> {
    let interactions = state
        .api(token)
        .get_interactions(query.client_id.as_deref())
        .await?;
    Ok(Json(interactions))
}

pub async fn create_interaction(
    State(state): State<AppState>,
    Caller(token): Caller,
    payload: std::result::Result<Json<NewInteraction>, JsonRejection>,
) -> Result<(StatusCode, Json<Interaction>)> {
    let new = validated(payload)?;
    let interaction = state.api(token).create_interaction(new).await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

pub async fn update_interaction(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<InteractionUpdate>, JsonRejection>,
) -> Result<Json<Interaction>> {
    let update = validated(payload)?;
    Ok(Json(state.api(token).update_interaction(&id, update).await?))
}

pub async fn delete_interaction(
    State(state): State<AppState>,
    Caller(token): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.api(token).delete_interaction(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Profile

pub async fn get_profile(State(state): State<AppState>, Caller(token): Caller) -> Result<Json<Account>> {
    Ok(Json(state.api(token).get_profile().await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Caller(token): Caller,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Account>> {
    let update = validated(payload)?;
    let account = state.api(token).update_profile(update).await?;
    state.auth.notify_user_updated(AuthUser::from(&account));
    Ok(Json(account))
}
