//! Task pages. Every handler requires a logged-in user and only ever touches that
//! user's tasks; another user's task id behaves exactly like an unknown one.

use actix_web::{delete, get, http::StatusCode, post, web, HttpResponse};
use uuid::Uuid;

use crate::auth::{Flash, SessionContext};
use crate::error::AppError;
use crate::messages;
use crate::models::{Task, TaskForm, TaskQuery};
use crate::respond::{html, html_with_status};
use crate::routes::{paths, DeleteForm};
use crate::state::AppState;
use crate::store::Store;
use crate::views;

async fn find_owned_task(store: &dyn Store, id: Uuid, user_id: i32) -> Result<Task, AppError> {
    store
        .find_task(id)
        .await?
        .filter(|task| task.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Lists the current user's tasks, newest first.
///
/// ## Query Parameters:
/// - `status` (optional): one of `todo`, `in_progress`, `review`, `done`.
/// - `priority` (optional): one of `low`, `medium`, `high`, `urgent`.
/// - `search` (optional): case-insensitive match in title or description.
///
/// Blank or unknown filter values are ignored.
#[get("")]
pub async fn index(
    state: web::Data<AppState>,
    context: SessionContext,
    query: web::Query<TaskQuery>,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    let tasks = state.store.list_tasks(user.id, &query.to_filter()).await?;
    Ok(html(views::tasks::index_page(&context, &tasks, &query)))
}

#[get("/new")]
pub async fn new_form(context: SessionContext) -> Result<HttpResponse, AppError> {
    context.require_login()?;
    Ok(html(views::tasks::form_page(
        &context,
        "New task",
        paths::NEW_TASK,
        &TaskForm::default(),
        &[],
    )))
}

#[post("/new")]
pub async fn create(
    state: web::Data<AppState>,
    context: SessionContext,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    let form = form.into_inner();
    context.verify_csrf(&form.authenticity_token)?;

    match form.clone().into_input() {
        Ok(input) => {
            let task = state.store.create_task(Task::new(input, user.id)).await?;
            log::info!("user {} created task {}", user.id, task.id);
            Ok(context.redirect_with(
                &paths::task(task.id),
                Flash::notice(messages::TASK_CREATED),
            ))
        }
        Err(errors) => Ok(html_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            views::tasks::form_page(&context, "New task", paths::NEW_TASK, &form, &errors),
        )),
    }
}

#[get("/{id}")]
pub async fn show(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    let task = find_owned_task(state.store.as_ref(), path.into_inner(), user.id).await?;
    Ok(html(views::tasks::show_page(&context, &task)))
}

#[get("/{id}/edit")]
pub async fn edit_form(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    let task = find_owned_task(state.store.as_ref(), path.into_inner(), user.id).await?;
    Ok(html(views::tasks::form_page(
        &context,
        "Edit task",
        &paths::edit_task(task.id),
        &TaskForm::from_task(&task),
        &[],
    )))
}

#[post("/{id}/edit")]
pub async fn update(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<Uuid>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    let id = path.into_inner();
    let form = form.into_inner();
    context.verify_csrf(&form.authenticity_token)?;

    match form.clone().into_input() {
        Ok(input) => {
            let task = state
                .store
                .update_task(id, user.id, input)
                .await?
                .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
            Ok(context.redirect_with(
                &paths::task(task.id),
                Flash::notice(messages::TASK_UPDATED),
            ))
        }
        Err(errors) => {
            find_owned_task(state.store.as_ref(), id, user.id).await?;
            Ok(html_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                views::tasks::form_page(&context, "Edit task", &paths::edit_task(id), &form, &errors),
            ))
        }
    }
}

async fn destroy(
    state: &AppState,
    context: &SessionContext,
    id: Uuid,
    form: &DeleteForm,
) -> Result<HttpResponse, AppError> {
    let user = context.require_login()?;
    context.verify_csrf(&form.authenticity_token)?;
    if !state.store.delete_task(id, user.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    log::info!("user {} deleted task {}", user.id, id);
    Ok(context.redirect_with(paths::TASKS, Flash::notice(messages::TASK_DELETED)))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<Uuid>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    destroy(&state, &context, path.into_inner(), &form).await
}

#[post("/{id}")]
pub async fn delete_task_via_post(
    state: web::Data<AppState>,
    context: SessionContext,
    path: web::Path<Uuid>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    form.require_delete()?;
    destroy(&state, &context, path.into_inner(), &form).await
}
