use actix_web::http::StatusCode;

use super::escape;

/// Standalone error page. It is rendered from `AppError`, which has no session at hand,
/// so it carries no navigation.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{code} {reason} | Taskgate</title>
</head>
<body>
<main>
<h1>{code} {reason}</h1>
<p>{message}</p>
<p><a href="/">Back</a></p>
</main>
</body>
</html>"#,
        code = status.as_u16(),
        reason = escape(reason),
        message = escape(message),
    )
}
