//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Besides the usual failure classes (bad input, missing records, storage failures) it
//! carries the two recoverable gate failures of the site: authentication failures
//! (`LoginRequired`) and authorization failures (`PermissionDenied`, `NotAdministrator`).
//!
//! `AppError` implements `actix_web::error::ResponseError`. Gate failures become a
//! `303 See Other` redirect; the guard that raised one has already put the matching
//! [`AppError::gate_flash`] into the session. Everything else renders a small HTML
//! error page.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::auth::session::Flash;
use crate::messages;
use crate::respond::{html_with_status, redirect};
use crate::routes::paths;
use crate::views;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// No user is resolved for a page that needs one. Redirects to the login page.
    LoginRequired,
    /// The current user may not look at the requested record. Redirects to the task list.
    PermissionDenied,
    /// A regular user asked for an administrator page. Redirects to the task list.
    NotAdministrator,
    /// A state-changing form arrived without the session's anti-forgery token (HTTP 422).
    InvalidAuthenticityToken,
    /// Represents a client-side error due to a malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    NotFound(String),
    /// A uniqueness constraint was violated (HTTP 409).
    Conflict(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from database operations (HTTP 500).
    /// Wraps errors from the `sqlx` crate.
    DatabaseError(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::LoginRequired => write!(f, "Login required"),
            AppError::PermissionDenied => write!(f, "Permission denied"),
            AppError::NotAdministrator => write!(f, "Administrator required"),
            AppError::InvalidAuthenticityToken => write!(f, "Invalid authenticity token"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// The notice shown after a gate failure redirect.
    pub fn gate_flash(&self) -> Option<Flash> {
        match self {
            AppError::LoginRequired => Some(Flash::notice(messages::LOGIN_REQUIRED)),
            AppError::PermissionDenied => Some(Flash::alert(messages::NO_PERMISSION)),
            AppError::NotAdministrator => Some(Flash::alert(messages::NOT_ADMINISTRATOR)),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::LoginRequired | AppError::PermissionDenied | AppError::NotAdministrator => {
                StatusCode::SEE_OTHER
            }
            AppError::InvalidAuthenticityToken | AppError::ValidationError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::LoginRequired => redirect(paths::LOGIN),
            AppError::PermissionDenied | AppError::NotAdministrator => redirect(paths::TASKS),
            AppError::InvalidAuthenticityToken => html_with_status(
                status,
                views::errors::error_page(status, messages::INVALID_AUTHENTICITY_TOKEN),
            ),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg) => {
                html_with_status(status, views::errors::error_page(status, msg))
            }
            // Storage and internal details stay in the log.
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                log::error!("{}: {}", status, msg);
                html_with_status(
                    status,
                    views::errors::error_page(status, messages::SOMETHING_WENT_WRONG),
                )
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound` and unique-constraint violations to `Conflict`;
/// every other database error becomes `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::Conflict(db_err.message().to_string())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
