//! Client pages: list, create, detail with interactions, edit, delete.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;
use crm_core::display::{self, SelectOption};
use crm_core::schema::{ClientForm, InteractionForm};
use crm_core::{ClientFilter, ClientSummary, ListFilter, ListQuery};
use database::{ClientUpdate, InteractionType};

use crate::error::{PageError, PageResult};
use crate::routes::{ignore_failure, save_failed};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::views::{enum_options, ClientRow, FormErrors, InteractionRow};

const LIST_PATH: &str = "/dashboard/clients";

#[derive(Template)]
#[template(path = "clients/list.html")]
pub struct ClientsTemplate {
    pub user_name: String,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub rows: Vec<ClientRow>,
    pub total: usize,
    pub filtered: bool,
    pub summary: ClientSummary,
}

#[derive(Template)]
#[template(path = "clients/form.html")]
pub struct ClientFormTemplate {
    pub user_name: String,
    pub heading: &'static str,
    pub action: String,
    pub form: ClientForm,
    pub status_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "clients/detail.html")]
pub struct ClientDetailTemplate {
    pub user_name: String,
    pub client: ClientRow,
    pub interactions: Vec<InteractionRow>,
    pub form: InteractionForm,
    pub type_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

pub async fn list_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> PageResult<ClientsTemplate> {
    let clients = state.api(Some(current.token.clone())).get_clients().await?;
    let filter = ClientFilter::from(&query);

    Ok(ClientsTemplate {
        user_name: current.display_name(),
        search: filter.search.clone(),
        status_options: display::client_status_filter(filter.status),
        rows: filter.apply(&clients).into_iter().map(ClientRow::from).collect(),
        total: clients.len(),
        filtered: filter != ClientFilter::default(),
        summary: ClientSummary::compute(&clients),
    })
}

fn form_page(
    current: &CurrentUser,
    heading: &'static str,
    action: String,
    form: ClientForm,
    errors: FormErrors,
) -> ClientFormTemplate {
    ClientFormTemplate {
        user_name: current.display_name(),
        heading,
        action,
        status_options: enum_options::<database::ClientStatus>(&form.status),
        form,
        errors,
    }
}

pub async fn new_page(current: CurrentUser) -> ClientFormTemplate {
    let form = ClientForm {
        status: database::ClientStatus::default().as_str().to_string(),
        ..ClientForm::default()
    };
    form_page(
        &current,
        "Nuevo Cliente",
        format!("{}/new", LIST_PATH),
        form,
        FormErrors::none(),
    )
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ClientForm>,
) -> PageResult<Response> {
    let action = format!("{}/new", LIST_PATH);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&current, "Nuevo Cliente", action, form, errors.into());
            return Ok(page.into_response());
        }
    };

    match state.api(Some(current.token.clone())).create_client(new).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(e) => {
            let errors = save_failed(e)?;
            Ok(form_page(&current, "Nuevo Cliente", action, form, errors).into_response())
        }
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> PageResult<ClientFormTemplate> {
    let client = state.api(Some(current.token.clone())).get_client(&id).await?;
    Ok(form_page(
        &current,
        "Editar Cliente",
        format!("{}/{}/edit", LIST_PATH, id),
        ClientForm::from_client(&client),
        FormErrors::none(),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ClientForm>,
) -> PageResult<Response> {
    let action = format!("{}/{}/edit", LIST_PATH, id);
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = form_page(&current, "Editar Cliente", action, form, errors.into());
            return Ok(page.into_response());
        }
    };

    let api = state.api(Some(current.token.clone()));
    match api.update_client(&id, ClientUpdate::from(new)).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(e) if e.is_not_found() => Err(PageError::NotFound),
        Err(e) => {
            let errors = save_failed(e)?;
            Ok(form_page(&current, "Editar Cliente", action, form, errors).into_response())
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Redirect {
    let result = state.api(Some(current.token)).delete_client(&id).await;
    ignore_failure(result, "delete client");
    Redirect::to(LIST_PATH)
}

async fn detail(
    state: &AppState,
    current: &CurrentUser,
    id: &str,
    form: InteractionForm,
    errors: FormErrors,
) -> PageResult<ClientDetailTemplate> {
    let api = state.api(Some(current.token.clone()));
    let client = api.get_client(id).await?;
    let interactions = api.get_interactions(Some(id)).await?;

    Ok(ClientDetailTemplate {
        user_name: current.display_name(),
        client: ClientRow::from(&client),
        interactions: interactions.iter().map(InteractionRow::from).collect(),
        type_options: enum_options::<InteractionType>(&form.kind),
        form,
        errors,
    })
}

pub async fn detail_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> PageResult<ClientDetailTemplate> {
    let form = InteractionForm {
        client_id: id.clone(),
        kind: InteractionType::Call.as_str().to_string(),
        date: Utc::now().date_naive().to_string(),
        ..InteractionForm::default()
    };
    detail(&state, &current, &id, form, FormErrors::none()).await
}

pub async fn create_interaction(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(mut form): Form<InteractionForm>,
) -> PageResult<Response> {
    form.client_id = id.clone();

    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            let page = detail(&state, &current, &id, form, errors.into()).await?;
            return Ok(page.into_response());
        }
    };

    let api = state.api(Some(current.token.clone()));
    match api.create_interaction(new).await {
        Ok(_) => Ok(Redirect::to(&format!("{}/{}", LIST_PATH, id)).into_response()),
        Err(e) => {
            let errors = save_failed(e)?;
            Ok(detail(&state, &current, &id, form, errors).await?.into_response())
        }
    }
}

pub async fn delete_interaction(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, interaction_id)): Path<(String, String)>,
) -> Redirect {
    let result = state
        .api(Some(current.token))
        .delete_interaction(&interaction_id)
        .await;
    ignore_failure(result, "delete interaction");
    Redirect::to(&format!("{}/{}", LIST_PATH, id))
}
