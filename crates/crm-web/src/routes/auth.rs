//! Sign-in, sign-up, sign-out and password reset pages.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use crm_core::schema::{ResetConfirmForm, ResetRequestForm, SignInForm, SignUpForm};
use serde::Deserialize;
use tracing::warn;

use crate::session::{clear_session_cookie, session_cookie, Caller, SIGN_IN_PATH};
use crate::state::AppState;
use crate::views::FormErrors;

const AFTER_SIGN_IN: &str = "/dashboard";

#[derive(Template)]
#[template(path = "auth/signin.html")]
pub struct SignInTemplate {
    pub email: String,
    pub notice: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignUpTemplate {
    pub email: String,
    pub full_name: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "auth/reset_request.html")]
pub struct ResetRequestTemplate {
    pub email: String,
    pub sent: bool,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "auth/reset_confirm.html")]
pub struct ResetConfirmTemplate {
    pub token: String,
    pub errors: FormErrors,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    pub reset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub token: String,
}

/// `/`: dashboard for signed-in users, sign-in page otherwise.
pub async fn root(State(state): State<AppState>, Caller(token): Caller) -> Redirect {
    let signed_in = match token {
        Some(token) => state.auth.get_current_user(&token).await.is_some(),
        None => false,
    };
    if signed_in {
        Redirect::to(AFTER_SIGN_IN)
    } else {
        Redirect::to(SIGN_IN_PATH)
    }
}

pub async fn sign_in_page(Query(query): Query<SignInQuery>) -> SignInTemplate {
    let notice = if query.reset.is_some() {
        "Contraseña actualizada. Inicia sesión con tu nueva contraseña."
    } else {
        ""
    };
    SignInTemplate {
        email: String::new(),
        notice: notice.to_string(),
        errors: FormErrors::none(),
    }
}

pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let rerender = |errors: FormErrors| SignInTemplate {
        email: form.email.clone(),
        notice: String::new(),
        errors,
    };

    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => return rerender(errors.into()).into_response(),
    };

    match state.auth.sign_in(data).await {
        Ok(session) => (
            [(SET_COOKIE, session_cookie(&session, state.secure_cookies))],
            Redirect::to(AFTER_SIGN_IN),
        )
            .into_response(),
        Err(e) => rerender(FormErrors::general(e.message)).into_response(),
    }
}

pub async fn sign_up_page() -> SignUpTemplate {
    SignUpTemplate {
        email: String::new(),
        full_name: String::new(),
        errors: FormErrors::none(),
    }
}

pub async fn sign_up(State(state): State<AppState>, Form(form): Form<SignUpForm>) -> Response {
    let rerender = |errors: FormErrors| SignUpTemplate {
        email: form.email.clone(),
        full_name: form.full_name.clone(),
        errors,
    };

    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => return rerender(errors.into()).into_response(),
    };

    match state.auth.sign_up(data).await {
        Ok(session) => (
            [(SET_COOKIE, session_cookie(&session, state.secure_cookies))],
            Redirect::to(AFTER_SIGN_IN),
        )
            .into_response(),
        Err(e) => rerender(FormErrors::general(e.message)).into_response(),
    }
}

pub async fn sign_out(State(state): State<AppState>, Caller(token): Caller) -> Response {
    if let Some(token) = token {
        if let Err(e) = state.auth.sign_out(&token).await {
            warn!(error = %e, "Sign-out failed");
        }
    }
    (
        [(SET_COOKIE, clear_session_cookie(state.secure_cookies))],
        Redirect::to(SIGN_IN_PATH),
    )
        .into_response()
}

pub async fn reset_request_page() -> ResetRequestTemplate {
    ResetRequestTemplate {
        email: String::new(),
        sent: false,
        errors: FormErrors::none(),
    }
}

pub async fn reset_request(
    State(state): State<AppState>,
    Form(form): Form<ResetRequestForm>,
) -> ResetRequestTemplate {
    let mut page = ResetRequestTemplate {
        email: form.email.clone(),
        sent: false,
        errors: FormErrors::none(),
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => {
            page.errors = errors.into();
            return page;
        }
    };

    match state.auth.request_password_reset(&email).await {
        Ok(_) => page.sent = true,
        Err(e) => page.errors = FormErrors::general(e.message),
    }
    page
}

pub async fn reset_confirm_page(Query(query): Query<ResetQuery>) -> ResetConfirmTemplate {
    ResetConfirmTemplate {
        token: query.token,
        errors: FormErrors::none(),
    }
}

pub async fn reset_confirm(
    State(state): State<AppState>,
    Form(form): Form<ResetConfirmForm>,
) -> Response {
    let rerender = |errors: FormErrors| ResetConfirmTemplate {
        token: form.token.clone(),
        errors,
    };

    let password = match form.validate() {
        Ok(password) => password,
        Err(errors) => return rerender(errors.into()).into_response(),
    };

    match state.auth.reset_password(&form.token, &password).await {
        Ok(()) => Redirect::to(&format!("{}?reset=1", SIGN_IN_PATH)).into_response(),
        Err(e) => rerender(FormErrors::general(e.message)).into_response(),
    }
}
