use actix_web::{get, web, HttpResponse};
use validator::Validate;

use crate::auth::{hash_password, SessionContext};
use crate::error::AppError;
use crate::messages;
use crate::models::user::error_messages;
use crate::models::{NewUser, User, UserForm};
use crate::respond::html;
use crate::state::AppState;
use crate::store::Store;
use crate::views;

/// Validates a sign-up or admin-create form and stores the account.
///
/// The outer `Result` carries storage failures; the inner one carries the messages
/// to show when the form has to be re-rendered.
pub(crate) async fn create_account(
    state: &AppState,
    form: &UserForm,
    admin: bool,
) -> Result<Result<User, Vec<String>>, AppError> {
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => error_messages(&e),
    };
    if !form.email.is_empty() && state.store.find_user_by_email(&form.email).await?.is_some() {
        errors.push(messages::EMAIL_TAKEN.to_string());
    }
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let new_user = NewUser {
        name: form.name.clone(),
        email: form.email.clone(),
        password_hash: hash_password(&form.password, state.bcrypt_cost)?,
        admin,
    };
    match state.store.create_user(new_user).await {
        Ok(user) => Ok(Ok(user)),
        // Lost a race with a concurrent sign-up for the same email.
        Err(AppError::Conflict(_)) => Ok(Err(vec![messages::EMAIL_TAKEN.to_string()])),
        Err(e) => Err(e),
    }
}

/// Looks up a user or fails with `NotFound`.
pub(crate) async fn find_user(store: &dyn Store, id: i32) -> Result<User, AppError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// A user's detail page, visible to that user and to administrators.
#[get("/users/{id}")]
pub async fn show(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    context.authorize_user_page(id)?;
    let user = find_user(state.store.as_ref(), id).await?;
    Ok(html(views::users::show_page(&context, &user)))
}
