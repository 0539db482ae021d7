use actix_web::{delete, get, http::StatusCode, post, web, HttpResponse};

use crate::auth::{verify_password, Flash, SessionContext};
use crate::error::AppError;
use crate::messages;
use crate::models::user::normalize_email;
use crate::models::{LoginForm, UserForm};
use crate::respond::{html, html_with_status, redirect};
use crate::routes::{paths, users::create_account, DeleteForm};
use crate::state::AppState;
use crate::views;

/// Registration form. A logged-in user is sent to their own page instead.
#[get("/users/new")]
pub async fn signup_form(context: SessionContext) -> Result<HttpResponse, AppError> {
    if let Some(user) = context.current_user() {
        return Ok(redirect(&paths::user(user.id)));
    }
    Ok(html(views::users::signup_page(
        &context,
        &UserForm::default(),
        &[],
    )))
}

/// Creates an account and logs it in.
///
/// Invalid input re-renders the form with `422`. Registration never grants the
/// administrator flag, whatever the form says.
#[post("/users/new")]
pub async fn signup(
    state: web::Data<AppState>,
    context: SessionContext,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    let mut form = form.into_inner().normalized();
    context.verify_csrf(&form.authenticity_token)?;
    if let Some(user) = context.current_user() {
        return Ok(redirect(&paths::user(user.id)));
    }

    match create_account(&state, &form, false).await? {
        Ok(user) => {
            log::info!("user {} registered", user.id);
            context.sign_in(user.id)?;
            Ok(context.redirect_with(
                &paths::user(user.id),
                Flash::notice(messages::ACCOUNT_CREATED),
            ))
        }
        Err(errors) => {
            form.password.clear();
            form.password_confirmation.clear();
            Ok(html_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                views::users::signup_page(&context, &form, &errors),
            ))
        }
    }
}

#[get("/session/new")]
pub async fn login_form(context: SessionContext) -> Result<HttpResponse, AppError> {
    if let Some(user) = context.current_user() {
        return Ok(redirect(&paths::user(user.id)));
    }
    Ok(html(views::sessions::login_page(&context, "", None)))
}

/// Checks the credentials and, on success, binds the user to a fresh session.
#[post("/session/new")]
pub async fn login(
    state: web::Data<AppState>,
    context: SessionContext,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    context.verify_csrf(&form.authenticity_token)?;
    if let Some(user) = context.current_user() {
        return Ok(redirect(&paths::user(user.id)));
    }

    let email = normalize_email(&form.email);
    let authenticated = match state.store.find_user_by_email(&email).await? {
        Some(user) => verify_password(&form.password, &user.password_hash)?.then_some(user),
        None => {
            // Unknown emails cost a full verification too.
            let _ = verify_password(&form.password, &state.dummy_hash);
            None
        }
    };

    match authenticated {
        Some(user) => {
            context.sign_in(user.id)?;
            Ok(context.redirect_with(
                &paths::user(user.id),
                Flash::notice(messages::LOGGED_IN),
            ))
        }
        None => {
            log::warn!("failed login attempt for {}", email);
            Ok(html_with_status(
                StatusCode::UNAUTHORIZED,
                views::sessions::login_page(&context, &email, Some(messages::INVALID_CREDENTIALS)),
            ))
        }
    }
}

fn sign_out(context: &SessionContext, form: &DeleteForm) -> Result<HttpResponse, AppError> {
    context.verify_csrf(&form.authenticity_token)?;
    if let Some(user) = context.current_user() {
        log::info!("user {} signed out", user.id);
    }
    context.sign_out();
    Ok(context.redirect_with(paths::LOGIN, Flash::notice(messages::LOGGED_OUT)))
}

#[delete("/session")]
pub async fn logout(
    context: SessionContext,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    sign_out(&context, &form)
}

#[post("/session")]
pub async fn logout_via_post(
    context: SessionContext,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    form.require_delete()?;
    sign_out(&context, &form)
}
