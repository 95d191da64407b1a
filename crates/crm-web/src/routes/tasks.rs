//! Task pages: list with summary, create, edit, quick status change, delete.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;
use crm_core::display::{self, Labeled, SelectOption};
use crm_core::schema::{parse_task_status, TaskForm};
use crm_core::{ListFilter, ListQuery, TaskFilter, TaskSummary};
use database::{Priority, TaskStatus, TaskUpdate};
use serde::Deserialize;
use tracing::warn;

use crate::error::{PageError, PageResult};
use crate::routes::{ignore_failure, save_failed};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::views::{client_options, enum_options, opportunity_options, FormErrors, TaskRow};

const LIST_PATH: &str = "/dashboard/tasks";

pub struct PriorityView {
    pub label: &'static str,
    pub badge_class: &'static str,
    pub count: usize,
}

#[derive(Template)]
#[template(path = "tasks/list.html")]
pub struct TasksTemplate {
    pub user_name: String,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub priority_options: Vec<SelectOption>,
    pub rows: Vec<TaskRow>,
    pub total: usize,
    pub filtered: bool,
    pub summary: TaskSummary,
    pub priorities: Vec<PriorityView>,
}

#[derive(Template)]
#[template(path = "tasks/form.html")]
pub struct TaskFormTemplate {
    pub user_name: String,
    pub heading: &'static str,
    pub action: String,
    pub form: TaskForm,
    pub client_options: Vec<SelectOption>,
    pub opportunity_options: Vec<SelectOption>,
    pub priority_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn list_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> PageResult<TasksTemplate> {
    let tasks = state.api(Some(current.token.clone())).get_tasks().await?;
    let filter = TaskFilter::from(&query);
    let now = Utc::now();
    let summary = TaskSummary::compute(&tasks, now);

    Ok(TasksTemplate {
        user_name: current.display_name(),
        search: filter.search.clone(),
        status_options: display::task_status_filter(filter.status),
        priority_options: display::priority_filter(filter.priority),
        rows: filter
            .apply(&tasks)
            .into_iter()
            .map(|t| TaskRow::new(t, now))
            .collect(),
        total: tasks.len(),
        filtered: filter != TaskFilter::default(),
        priorities: summary
            .by_priority
            .iter()
            .map(|p| PriorityView {
                label: p.priority.label(),
                badge_class: p.priority.badge_class(),
                count: p.count,
            })
            .collect(),
        summary,
    })
}

async fn form_page(
    state: &AppState,
    current: &CurrentUser,
    heading: &'static str,
    action: String,
    form: TaskForm,
    errors: FormErrors,
) -> PageResult<TaskFormTemplate> {
    let api = state.api(Some(current.token.clone()));
    let clients = api.get_clients().await?;
    let opportunities = api.get_opportunities().await?;

    Ok(TaskFormTemplate {
        user_name: current.display_name(),
        heading,
        action,
        client_options: client_options(&clients, &form.client_id),
        opportunity_options: opportunity_options(&opportunities, &form.opportunity_id),
        priority_options: enum_options::<Priority>(&form.priority),
        status_options: enum_options::<TaskStatus>(&form.status),
        form,
        errors,
    })
}

pub async fn new_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> PageResult<TaskFormTemplate> {
    let form = TaskForm {
        priority: Priority::default().as_str().to_string(),
        status: TaskStatus::default().as_str().to_string(),
        ..TaskForm::default()
    };
    let action = format!("{}/new", LIST_PATH);
    form_page(&state, &current, "Nueva Tarea", action, form, FormErrors::none()).await
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<TaskForm>,
) -> PageResult<Response> {
    let heading = "Nueva Tarea";
    let action = format!("{}/new", LIST_PATH);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&state, &current, heading, action, form, errors.into()).await?;
            return Ok(page.into_response());
        }
    };

    match state.api(Some(current.token.clone())).create_task(new).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(e) => {
            let errors = save_failed(e)?;
            let page = form_page(&state, &current, heading, action, form, errors).await?;
            Ok(page.into_response())
        }
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> PageResult<TaskFormTemplate> {
    let task = state.api(Some(current.token.clone())).get_task(&id).await?;
    let action = format!("{}/{}/edit", LIST_PATH, id);
    let form = TaskForm::from_task(&task);
    form_page(&state, &current, "Editar Tarea", action, form, FormErrors::none()).await
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> PageResult<Response> {
    let heading = "Editar Tarea";
    let action = format!("{}/{}/edit", LIST_PATH, id);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&state, &current, heading, action, form, errors.into()).await?;
            return Ok(page.into_response());
        }
    };

    let api = state.api(Some(current.token.clone()));
    match api.update_task(&id, TaskUpdate::from(new)).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(e) if e.is_missing("Task") => Err(PageError::NotFound),
        Err(e) => {
            let errors = save_failed(e)?;
            let page = form_page(&state, &current, heading, action, form, errors).await?;
            Ok(page.into_response())
        }
    }
}

/// Quick status change from the list. Failures are logged only.
pub async fn set_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    match parse_task_status(&form.status) {
        Ok(status) => {
            let result = state
                .api(Some(current.token))
                .update_task(&id, TaskUpdate::status(status))
                .await;
            ignore_failure(result, "update task status");
        }
        Err(e) => warn!(error = %e, "Ignoring task status change"),
    }
    Redirect::to(LIST_PATH)
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Redirect {
    let result = state.api(Some(current.token)).delete_task(&id).await;
    ignore_failure(result, "delete task");
    Redirect::to(LIST_PATH)
}
