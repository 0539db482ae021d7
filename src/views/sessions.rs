use crate::auth::SessionContext;
use crate::routes::paths;

use super::{csrf_field, escape, layout};

/// The login form. `error` is shown above the form after a failed attempt.
pub fn login_page(context: &SessionContext, email: &str, error: Option<&str>) -> String {
    let error = match error {
        Some(message) => format!(r#"<p class="alert">{}</p>"#, escape(message)),
        None => String::new(),
    };
    let body = format!(
        r#"<h1>Log in</h1>
{error}
<form method="post" action="{action}">
  {csrf}
  <label>Email <input type="email" name="email" value="{email}" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p><a href="{signup}">Sign up</a></p>"#,
        error = error,
        action = paths::LOGIN,
        csrf = csrf_field(context),
        email = escape(email),
        signup = paths::SIGNUP,
    );
    layout("Log in", context, &body)
}
