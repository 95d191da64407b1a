//! Profile page.

use askama::Template;
use axum::extract::State;
use axum::Form;
use crm_core::schema::ProfileForm;
use crm_core::AuthUser;

use crate::error::PageResult;
use crate::routes::save_failed;
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::views::FormErrors;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user_name: String,
    pub form: ProfileForm,
    pub saved: bool,
    pub errors: FormErrors,
}

pub async fn profile_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> PageResult<ProfileTemplate> {
    let account = state.api(Some(current.token.clone())).get_profile().await?;

    Ok(ProfileTemplate {
        user_name: current.display_name(),
        form: ProfileForm {
            full_name: account.full_name.unwrap_or_default(),
            email: account.email,
            avatar_url: account.avatar_url.unwrap_or_default(),
        },
        saved: false,
        errors: FormErrors::none(),
    })
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> PageResult<ProfileTemplate> {
    let mut page = ProfileTemplate {
        user_name: current.display_name(),
        form,
        saved: false,
        errors: FormErrors::none(),
    };

    let update = match page.form.validate() {
        Ok(update) => update,
        Err(errors) => {
            page.errors = errors.into();
            return Ok(page);
        }
    };

    match state.api(Some(current.token.clone())).update_profile(update).await {
        Ok(account) => {
            let user = AuthUser::from(&account);
            page.user_name = user.full_name.clone().unwrap_or_else(|| user.email.clone());
            state.auth.notify_user_updated(user);
            page.saved = true;
        }
        Err(e) if e.is_conflict() => {
            page.errors = FormErrors::general("Ese email ya está registrado");
        }
        Err(e) => page.errors = save_failed(e)?,
    }
    Ok(page)
}
