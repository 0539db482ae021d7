pub mod admin;
pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::error::AppError;
use crate::respond::redirect;

/// Paths of the HTML pages, shared by handlers, redirects and views.
pub mod paths {
    use uuid::Uuid;

    pub const SIGNUP: &str = "/users/new";
    pub const LOGIN: &str = "/session/new";
    pub const SESSION: &str = "/session";
    pub const TASKS: &str = "/tasks";
    pub const NEW_TASK: &str = "/tasks/new";
    pub const ADMIN_USERS: &str = "/admin/users";
    pub const NEW_ADMIN_USER: &str = "/admin/users/new";

    pub fn user(id: i32) -> String {
        format!("/users/{}", id)
    }

    pub fn task(id: Uuid) -> String {
        format!("/tasks/{}", id)
    }

    pub fn edit_task(id: Uuid) -> String {
        format!("/tasks/{}/edit", id)
    }

    pub fn admin_user(id: i32) -> String {
        format!("/admin/users/{}", id)
    }

    pub fn edit_admin_user(id: i32) -> String {
        format!("/admin/users/{}/edit", id)
    }
}

/// Body of a delete form. Browsers can only post forms, so deletes arrive either as a real
/// `DELETE` or as a `POST` carrying `_method=delete`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "_method", default)]
    pub method: String,
    #[serde(default)]
    pub authenticity_token: String,
}

impl DeleteForm {
    /// Rejects a `POST` that does not ask for a delete.
    pub fn require_delete(&self) -> Result<(), AppError> {
        if self.method.eq_ignore_ascii_case("delete") {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Unsupported form method {:?}",
                self.method
            )))
        }
    }
}

#[get("/")]
pub async fn root() -> impl Responder {
    redirect(paths::TASKS)
}

/// Registers every page that runs behind the session middleware.
///
/// Literal segments such as `/users/new` are registered before the `{id}` patterns
/// they would otherwise collide with.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(root)
        .service(auth::signup_form)
        .service(auth::signup)
        .service(auth::login_form)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::logout_via_post)
        .service(users::show)
        .service(
            web::scope("/tasks")
                .service(tasks::index)
                .service(tasks::new_form)
                .service(tasks::create)
                .service(tasks::show)
                .service(tasks::delete_task)
                .service(tasks::delete_task_via_post)
                .service(tasks::edit_form)
                .service(tasks::update),
        )
        .service(
            web::scope("/admin/users")
                .service(admin::index)
                .service(admin::new_form)
                .service(admin::create)
                .service(admin::show)
                .service(admin::delete_user)
                .service(admin::delete_user_via_post)
                .service(admin::edit_form)
                .service(admin::update),
        );
}

/// Fallback for unknown pages inside the session scope.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Page not found".into()))
}
