use crate::auth::SessionContext;
use crate::models::{User, UserForm};
use crate::routes::paths;

use super::{csrf_field, error_list, escape, layout};

/// Name, email and password inputs shared by sign-up and the admin forms.
/// `admin` adds the administrator checkbox with the given state.
pub(crate) fn user_fields(name: &str, email: &str, password_hint: &str, admin: Option<bool>) -> String {
    let admin_field = match admin {
        Some(checked) => format!(
            r#"<label><input type="checkbox" name="admin" value="1"{}> Administrator</label>"#,
            if checked { " checked" } else { "" }
        ),
        None => String::new(),
    };
    format!(
        r#"<label>Name <input type="text" name="name" value="{name}" maxlength="30" required></label>
  <label>Email <input type="email" name="email" value="{email}" required></label>
  <label>Password{hint} <input type="password" name="password"></label>
  <label>Password confirmation <input type="password" name="password_confirmation"></label>
  {admin_field}"#,
        name = escape(name),
        email = escape(email),
        hint = escape(password_hint),
        admin_field = admin_field,
    )
}

/// The registration form, re-rendered with `errors` after a failed submit.
pub fn signup_page(context: &SessionContext, form: &UserForm, errors: &[String]) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{errors}
<form method="post" action="{action}">
  {csrf}
  {fields}
  <button type="submit">Create my account</button>
</form>
<p><a href="{login}">Log in</a></p>"#,
        errors = error_list(errors),
        action = paths::SIGNUP,
        csrf = csrf_field(context),
        fields = user_fields(&form.name, &form.email, "", None),
        login = paths::LOGIN,
    );
    layout("Sign up", context, &body)
}

pub fn show_page(context: &SessionContext, user: &User) -> String {
    let role = if user.admin { "Administrator" } else { "Member" };
    let body = format!(
        r#"<h1>{name}</h1>
<dl>
  <dt>Email</dt><dd>{email}</dd>
  <dt>Role</dt><dd>{role}</dd>
  <dt>Member since</dt><dd>{since}</dd>
</dl>
<p><a href="{tasks}">Tasks</a></p>"#,
        name = escape(&user.name),
        email = escape(&user.email),
        role = role,
        since = user.created_at.format("%Y-%m-%d"),
        tasks = paths::TASKS,
    );
    layout(&user.name, context, &body)
}
