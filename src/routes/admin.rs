//! User management for administrators. Every handler starts with the role guard.

use actix_web::{delete, get, http::StatusCode, post, web, HttpResponse};
use validator::Validate;

use crate::auth::{hash_password, Flash, SessionContext};
use crate::error::AppError;
use crate::messages;
use crate::models::user::error_messages;
use crate::models::{EditUserForm, TaskFilter, UserChanges, UserForm};
use crate::respond::{html, html_with_status};
use crate::routes::users::{create_account, find_user};
use crate::routes::{paths, DeleteForm};
use crate::state::AppState;
use crate::views;

#[get("")]
pub async fn index(
    state: web::Data<AppState>,
    context: SessionContext,
) -> Result<HttpResponse, AppError> {
    context.require_admin()?;
    let users = state.store.list_users().await?;
    Ok(html(views::admin::index_page(&context, &users)))
}

#[get("/new")]
pub async fn new_form(context: SessionContext) -> Result<HttpResponse, AppError> {
    context.require_admin()?;
    Ok(html(views::admin::new_page(&context, &UserForm::default(), &[])))
}

#[post("/new")]
pub async fn create(
    state: web::Data<AppState>,
    context: SessionContext,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    let admin = context.require_admin()?;
    let mut form = form.into_inner().normalized();
    context.verify_csrf(&form.authenticity_token)?;

    match create_account(&state, &form, form.admin_requested()).await? {
        Ok(user) => {
            log::info!("admin {} created user {}", admin.id, user.id);
            Ok(context.redirect_with(
                &paths::admin_user(user.id),
                Flash::notice(messages::USER_CREATED),
            ))
        }
        Err(errors) => {
            form.password.clear();
            form.password_confirmation.clear();
            Ok(html_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                views::admin::new_page(&context, &form, &errors),
            ))
        }
    }
}

/// A user's details together with all of their tasks.
#[get("/{id}")]
pub async fn show(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    context.require_admin()?;
    let user = find_user(state.store.as_ref(), path.into_inner()).await?;
    let tasks = state
        .store
        .list_tasks(user.id, &TaskFilter::default())
        .await?;
    Ok(html(views::admin::show_page(&context, &user, &tasks)))
}

#[get("/{id}/edit")]
pub async fn edit_form(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    context.require_admin()?;
    let user = find_user(state.store.as_ref(), path.into_inner()).await?;
    Ok(html(views::admin::edit_page(
        &context,
        user.id,
        &EditUserForm::from_user(&user),
        &[],
    )))
}

/// Applies the edit form. A blank password keeps the current one, and an administrator's
/// own admin flag is left as it is.
#[post("/{id}/edit")]
pub async fn update(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
    form: web::Form<EditUserForm>,
) -> Result<HttpResponse, AppError> {
    let admin = context.require_admin()?;
    let id = path.into_inner();
    let mut form = form.into_inner().normalized();
    context.verify_csrf(&form.authenticity_token)?;
    let user = find_user(state.store.as_ref(), id).await?;

    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => error_messages(&e),
    };
    if let Some(other) = state.store.find_user_by_email(&form.email).await? {
        if other.id != id {
            errors.push(messages::EMAIL_TAKEN.to_string());
        }
    }

    if errors.is_empty() {
        let changes = UserChanges {
            name: form.name.clone(),
            email: form.email.clone(),
            password_hash: form
                .new_password()
                .map(|password| hash_password(password, state.bcrypt_cost))
                .transpose()?,
            admin: if id == admin.id {
                user.admin
            } else {
                form.admin_requested()
            },
        };
        match state.store.update_user(id, changes).await {
            Ok(Some(updated)) => {
                log::info!("admin {} updated user {}", admin.id, updated.id);
                return Ok(context.redirect_with(
                    &paths::admin_user(updated.id),
                    Flash::notice(messages::USER_UPDATED),
                ));
            }
            Ok(None) => return Err(AppError::NotFound("User not found".into())),
            Err(AppError::Conflict(_)) => errors.push(messages::EMAIL_TAKEN.to_string()),
            Err(e) => return Err(e),
        }
    }

    form.password.clear();
    form.password_confirmation.clear();
    Ok(html_with_status(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::admin::edit_page(&context, id, &form, &errors),
    ))
}

async fn destroy(
    state: &AppState,
    context: &SessionContext,
    id: i32,
    form: &DeleteForm,
) -> Result<HttpResponse, AppError> {
    let admin = context.require_admin()?;
    context.verify_csrf(&form.authenticity_token)?;
    if id == admin.id {
        return Ok(context.redirect_with(
            paths::ADMIN_USERS,
            Flash::alert(messages::CANNOT_DELETE_SELF),
        ));
    }
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("admin {} deleted user {}", admin.id, id);
    Ok(context.redirect_with(
        paths::ADMIN_USERS,
        Flash::notice(messages::USER_DELETED),
    ))
}

#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    destroy(&state, &context, path.into_inner(), &form).await
}

#[post("/{id}")]
pub async fn delete_user_via_post(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<i32>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    form.require_delete()?;
    destroy(&state, &context, path.into_inner(), &form).await
}
