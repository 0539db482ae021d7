use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row as listed on the admin dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummary {
    #[sqlx(flatten)]
    pub user: User,
    pub task_count: i64,
}

/// A user ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub admin: bool,
}

/// Changes applied by the admin edit form. `password_hash: None` keeps the current password.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub admin: bool,
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Sign-up form, also used by administrators to create accounts.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "password_confirmed", skip_on_field_errors = false))]
pub struct UserForm {
    #[validate(length(min = 1, max = 30, message = "Name must be between 1 and 30 characters"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password is too short (minimum is 6 characters)"))]
    pub password: String,
    pub password_confirmation: String,
    /// Checkbox on the admin form; ignored on self sign-up.
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default)]
    pub authenticity_token: String,
}

impl UserForm {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }

    pub fn admin_requested(&self) -> bool {
        checkbox_checked(self.admin.as_deref())
    }
}

fn password_confirmed(form: &UserForm) -> Result<(), ValidationError> {
    confirmation_matches(&form.password, &form.password_confirmation)
}

/// Admin edit form. A blank password keeps the current one.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "password_change_valid", skip_on_field_errors = false))]
pub struct EditUserForm {
    #[validate(length(min = 1, max = 30, message = "Name must be between 1 and 30 characters"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default)]
    pub authenticity_token: String,
}

impl EditUserForm {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }

    pub fn admin_requested(&self) -> bool {
        checkbox_checked(self.admin.as_deref())
    }

    pub fn new_password(&self) -> Option<&str> {
        if self.password.is_empty() {
            None
        } else {
            Some(&self.password)
        }
    }

    /// Prefills the edit form from the stored user.
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            password: String::new(),
            password_confirmation: String::new(),
            admin: user.admin.then(|| "1".to_string()),
            authenticity_token: String::new(),
        }
    }
}

fn password_change_valid(form: &EditUserForm) -> Result<(), ValidationError> {
    if form.password.is_empty() && form.password_confirmation.is_empty() {
        return Ok(());
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        let mut error = ValidationError::new("password_length");
        error.message = Some("Password is too short (minimum is 6 characters)".into());
        return Err(error);
    }
    confirmation_matches(&form.password, &form.password_confirmation)
}

fn confirmation_matches(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password == confirmation {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_confirmation");
        error.message = Some("Password confirmation doesn't match Password".into());
        Err(error)
    }
}

fn checkbox_checked(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("on"))
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub authenticity_token: String,
}

/// Flattens validation errors into sorted, human-readable messages.
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages
}
