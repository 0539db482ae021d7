//! Administrator pages for managing user accounts.

use crate::auth::SessionContext;
use crate::models::{EditUserForm, Task, User, UserForm, UserSummary};
use crate::routes::paths;

use super::tasks::task_rows;
use super::users::user_fields;
use super::{csrf_field, delete_button, error_list, escape, layout};

const DELETE_CONFIRMATION: &str = "Delete this user and all of their tasks?";

pub fn index_page(context: &SessionContext, users: &[UserSummary]) -> String {
    let rows: String = users
        .iter()
        .map(|summary| {
            let user = &summary.user;
            format!(
                r#"<tr><td><a href="{show}">{name}</a></td><td>{email}</td><td>{admin}</td><td>{tasks}</td><td><a href="{edit}">Edit</a> {delete}</td></tr>"#,
                show = paths::admin_user(user.id),
                name = escape(&user.name),
                email = escape(&user.email),
                admin = if user.admin { "Yes" } else { "No" },
                tasks = summary.task_count,
                edit = paths::edit_admin_user(user.id),
                delete = delete_button(
                    context,
                    &paths::admin_user(user.id),
                    "Delete",
                    DELETE_CONFIRMATION
                ),
            )
        })
        .collect();
    let body = format!(
        r#"<h1>Admin dashboard</h1>
<p><a href="{new}">New user</a></p>
<table>
<thead><tr><th>Name</th><th>Email</th><th>Administrator</th><th>Tasks</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"#,
        new = paths::NEW_ADMIN_USER,
        rows = rows,
    );
    layout("Admin dashboard", context, &body)
}

pub fn show_page(context: &SessionContext, user: &User, tasks: &[Task]) -> String {
    let body = format!(
        r#"<h1>Admin dashboard</h1>
<h2>{name}</h2>
<dl>
  <dt>Email</dt><dd>{email}</dd>
  <dt>Administrator</dt><dd>{admin}</dd>
  <dt>Member since</dt><dd>{since}</dd>
</dl>
<h3>Tasks ({count})</h3>
{tasks}
<p><a href="{edit}">Edit</a> <a href="{back}">Back</a></p>
{delete}"#,
        name = escape(&user.name),
        email = escape(&user.email),
        admin = if user.admin { "Yes" } else { "No" },
        since = user.created_at.format("%Y-%m-%d"),
        count = tasks.len(),
        tasks = task_rows(tasks, false),
        edit = paths::edit_admin_user(user.id),
        back = paths::ADMIN_USERS,
        delete = delete_button(
            context,
            &paths::admin_user(user.id),
            "Delete",
            DELETE_CONFIRMATION
        ),
    );
    layout(&user.name, context, &body)
}

pub fn new_page(context: &SessionContext, form: &UserForm, errors: &[String]) -> String {
    let body = format!(
        r#"<h1>Admin dashboard</h1>
<h2>New user</h2>
{errors}
<form method="post" action="{action}">
  {csrf}
  {fields}
  <button type="submit">Create user</button>
</form>
<p><a href="{back}">Back</a></p>"#,
        errors = error_list(errors),
        action = paths::NEW_ADMIN_USER,
        csrf = csrf_field(context),
        fields = user_fields(&form.name, &form.email, "", Some(form.admin_requested())),
        back = paths::ADMIN_USERS,
    );
    layout("New user", context, &body)
}

pub fn edit_page(
    context: &SessionContext,
    user_id: i32,
    form: &EditUserForm,
    errors: &[String],
) -> String {
    let action = paths::edit_admin_user(user_id);
    let body = format!(
        r#"<h1>Admin dashboard</h1>
<h2>Edit user</h2>
{errors}
<form method="post" action="{action}">
  {csrf}
  {fields}
  <button type="submit">Update user</button>
</form>
<p><a href="{back}">Back</a></p>"#,
        errors = error_list(errors),
        action = action,
        csrf = csrf_field(context),
        fields = user_fields(
            &form.name,
            &form.email,
            " (leave blank to keep the current one)",
            Some(form.admin_requested())
        ),
        back = paths::admin_user(user_id),
    );
    layout("Edit user", context, &body)
}
