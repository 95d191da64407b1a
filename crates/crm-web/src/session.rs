//! Session token transport: bearer header or `crm_session` cookie.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::Redirect;
use chrono::Utc;
use crm_core::{AuthSession, AuthUser};

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "crm_session";

/// Where unauthenticated page requests are sent.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Session token of a request, from `Authorization: Bearer` or the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn cookie_attributes(secure: bool) -> &'static str {
    if secure {
        "Path=/; HttpOnly; SameSite=Lax; Secure"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    }
}

/// `Set-Cookie` value storing a session. `secure` restricts it to HTTPS.
pub fn session_cookie(session: &AuthSession, secure: bool) -> String {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{}={}; {}; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        cookie_attributes(secure),
        max_age
    )
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    format!("{}=; {}; Max-Age=0", SESSION_COOKIE, cookie_attributes(secure))
}

/// The caller's session token, if any. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(session_token(&parts.headers)))
    }
}

/// A signed-in user. Page requests without a valid session are redirected
/// to the sign-in page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub token: String,
}

impl CurrentUser {
    /// Name shown in the navigation bar.
    pub fn display_name(&self) -> String {
        self.user
            .full_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.user.email.clone())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Err(Redirect::to(SIGN_IN_PATH));
        };
        match state.auth.get_current_user(&token).await {
            Some(user) => Ok(CurrentUser { user, token }),
            None => Err(Redirect::to(SIGN_IN_PATH)),
        }
    }
}
