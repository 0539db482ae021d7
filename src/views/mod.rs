//! Server-rendered HTML pages.
//!
//! Pages are built with `format!` into plain strings. Every value that came from a user
//! goes through [`escape`] before it is interpolated.

pub mod admin;
pub mod errors;
pub mod sessions;
pub mod tasks;
pub mod users;

use crate::auth::{FlashKind, SessionContext};
use crate::routes::paths;

/// Escapes text for HTML element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Hidden anti-forgery field for a state-changing form.
pub fn csrf_field(context: &SessionContext) -> String {
    format!(
        r#"<input type="hidden" name="authenticity_token" value="{}">"#,
        escape(&context.csrf_token())
    )
}

/// A one-button form that submits a `DELETE` through the `_method` override.
pub fn delete_button(context: &SessionContext, action: &str, label: &str, confirm: &str) -> String {
    format!(
        r#"<form class="inline" method="post" action="{action}" onsubmit="return confirm('{confirm}');">
  {csrf}
  <input type="hidden" name="_method" value="delete">
  <button type="submit">{label}</button>
</form>"#,
        action = escape(action),
        confirm = escape(confirm),
        csrf = csrf_field(context),
        label = escape(label),
    )
}

/// Validation messages above a form.
pub fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!(r#"<div class="errors"><ul>{}</ul></div>"#, items)
}

fn flash(context: &SessionContext) -> String {
    match &context.flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Notice => "notice",
                FlashKind::Alert => "alert",
            };
            format!(
                r#"<p class="flash {}">{}</p>"#,
                class,
                escape(&flash.message)
            )
        }
        None => String::new(),
    }
}

fn navigation(context: &SessionContext) -> String {
    match context.current_user() {
        Some(user) => {
            let admin_link = if context.principal.is_admin() {
                format!(r#" <a href="{}">Admin</a>"#, paths::ADMIN_USERS)
            } else {
                String::new()
            };
            format!(
                r#"<nav><a href="{tasks}">Tasks</a>{admin} <a href="{profile}">{name}</a>
  <form class="inline" method="post" action="{logout}">
    {csrf}
    <input type="hidden" name="_method" value="delete">
    <button type="submit">Log out</button>
  </form>
</nav>"#,
                tasks = paths::TASKS,
                admin = admin_link,
                profile = paths::user(user.id),
                name = escape(&user.name),
                logout = paths::SESSION,
                csrf = csrf_field(context),
            )
        }
        None => format!(
            r#"<nav><a href="{}">Log in</a> <a href="{}">Sign up</a></nav>"#,
            paths::LOGIN,
            paths::SIGNUP
        ),
    }
}

/// Wraps page content with the document shell, navigation and the pending flash.
pub fn layout(title: &str, context: &SessionContext, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Taskgate</title>
</head>
<body>
{nav}
{flash}
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = navigation(context),
        flash = flash(context),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::CSRF_TOKEN_KEY;
    use crate::auth::{Flash, Principal};
    use crate::models::User;
    use actix_session::SessionExt;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    fn context(principal: Principal) -> SessionContext {
        let session = TestRequest::default().to_http_request().get_session();
        session.insert(CSRF_TOKEN_KEY, "token").unwrap();
        SessionContext::new(principal, session)
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & co"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; co"
        );
        assert_eq!(escape("You don't have permission!"), "You don't have permission!");
    }

    #[test]
    fn test_layout_shows_flash_and_anonymous_nav() {
        let mut context = context(Principal::Anonymous);
        context.flash = Some(Flash::notice("Login required"));
        let page = layout("Log in", &context, "<h1>Log in</h1>");

        assert!(page.contains(r#"<p class="flash notice">Login required</p>"#));
        assert!(page.contains("Sign up"));
        assert!(!page.contains("Log out"));
    }

    #[test]
    fn test_layout_for_admin_links_dashboard_and_logout() {
        let now = Utc::now();
        let context = context(Principal::Admin(User {
            id: 3,
            name: "<admin>".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            admin: true,
            created_at: now,
            updated_at: now,
        }));
        let page = layout("Tasks", &context, "");

        assert!(page.contains(r#"href="/admin/users""#));
        assert!(page.contains(r#"href="/users/3">&lt;admin&gt;</a>"#));
        assert!(page.contains(r#"name="authenticity_token" value="token""#));
        assert!(page.contains("Log out"));
    }
}
