//! Opportunity pages: pipeline list, create, edit, delete.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use crm_core::display::{self, format_currency, Labeled, SelectOption};
use crm_core::schema::OpportunityForm;
use crm_core::{ListFilter, ListQuery, OpportunityFilter, PipelineSummary};
use database::{OpportunityUpdate, Stage};

use crate::error::{PageError, PageResult};
use crate::routes::{ignore_failure, save_failed};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::views::{client_options, enum_options, FormErrors, OpportunityRow};

const LIST_PATH: &str = "/dashboard/opportunities";

/// One stage column of the pipeline summary.
pub struct StageView {
    pub label: &'static str,
    pub badge_class: &'static str,
    pub count: usize,
    pub value: String,
}

#[derive(Template)]
#[template(path = "opportunities/list.html")]
pub struct OpportunitiesTemplate {
    pub user_name: String,
    pub search: String,
    pub stage_options: Vec<SelectOption>,
    pub rows: Vec<OpportunityRow>,
    pub total: usize,
    pub filtered: bool,
    pub total_value: String,
    pub won_value: String,
    pub conversion_rate: u32,
    pub stages: Vec<StageView>,
}

#[derive(Template)]
#[template(path = "opportunities/form.html")]
pub struct OpportunityFormTemplate {
    pub user_name: String,
    pub heading: &'static str,
    pub action: String,
    pub form: OpportunityForm,
    pub client_options: Vec<SelectOption>,
    pub stage_options: Vec<SelectOption>,
    pub has_clients: bool,
    pub errors: FormErrors,
}

pub async fn list_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> PageResult<OpportunitiesTemplate> {
    let opportunities = state
        .api(Some(current.token.clone()))
        .get_opportunities()
        .await?;
    let filter = OpportunityFilter::from(&query);
    let summary = PipelineSummary::compute(&opportunities);

    Ok(OpportunitiesTemplate {
        user_name: current.display_name(),
        search: filter.search.clone(),
        stage_options: display::stage_filter(filter.stage),
        rows: filter
            .apply(&opportunities)
            .into_iter()
            .map(OpportunityRow::from)
            .collect(),
        total: opportunities.len(),
        filtered: filter != OpportunityFilter::default(),
        total_value: format_currency(summary.total_value),
        won_value: format_currency(summary.won_value),
        conversion_rate: summary.conversion_rate(),
        stages: summary
            .stages
            .iter()
            .map(|s| StageView {
                label: s.stage.label(),
                badge_class: s.stage.badge_class(),
                count: s.count,
                value: format_currency(s.value),
            })
            .collect(),
    })
}

async fn form_page(
    state: &AppState,
    current: &CurrentUser,
    heading: &'static str,
    action: String,
    form: OpportunityForm,
    errors: FormErrors,
) -> PageResult<OpportunityFormTemplate> {
    let clients = state.api(Some(current.token.clone())).get_clients().await?;

    Ok(OpportunityFormTemplate {
        user_name: current.display_name(),
        heading,
        action,
        client_options: client_options(&clients, &form.client_id),
        stage_options: enum_options::<Stage>(&form.stage),
        has_clients: !clients.is_empty(),
        form,
        errors,
    })
}

pub async fn new_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> PageResult<OpportunityFormTemplate> {
    let form = OpportunityForm {
        stage: Stage::default().as_str().to_string(),
        ..OpportunityForm::default()
    };
    let action = format!("{}/new", LIST_PATH);
    form_page(&state, &current, "Nueva Oportunidad", action, form, FormErrors::none()).await
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<OpportunityForm>,
) -> PageResult<Response> {
    let heading = "Nueva Oportunidad";
    let action = format!("{}/new", LIST_PATH);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&state, &current, heading, action, form, errors.into()).await?;
            return Ok(page.into_response());
        }
    };

    match state.api(Some(current.token.clone())).create_opportunity(new).await {
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
) -> PageResult<OpportunityFormTemplate> {
    let opportunity = state
        .api(Some(current.token.clone()))
        .get_opportunity(&id)
        .await?;
    let form = OpportunityForm::from_opportunity(&opportunity);
    let action = format!("{}/{}/edit", LIST_PATH, id);
    form_page(&state, &current, "Editar Oportunidad", action, form, FormErrors::none()).await
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<OpportunityForm>,
) -> PageResult<Response> {
    let heading = "Editar Oportunidad";
    let action = format!("{}/{}/edit", LIST_PATH, id);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&state, &current, heading, action, form, errors.into()).await?;
            return Ok(page.into_response());
        }
    };

    let api = state.api(Some(current.token.clone()));
    match api.update_opportunity(&id, OpportunityUpdate::from(new)).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(e) if e.is_missing("Opportunity") => Err(PageError::NotFound),
        Err(e) => {
            let errors = save_failed(e)?;
            let page = form_page(&state, &current, heading, action, form, errors).await?;
            Ok(page.into_response())
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Redirect {
    let result = state.api(Some(current.token)).delete_opportunity(&id).await;
    ignore_failure(result, "delete opportunity");
    Redirect::to(LIST_PATH)
}
