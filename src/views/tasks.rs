use crate::auth::SessionContext;
use crate::models::{Task, TaskForm, TaskPriority, TaskQuery, TaskStatus};
use crate::routes::paths;

use super::{csrf_field, delete_button, error_list, escape, layout};

fn options<'a>(
    choices: impl Iterator<Item = (&'a str, &'a str)>,
    selected: &str,
    blank: Option<&str>,
) -> String {
    let mut html = match blank {
        Some(label) => format!(r#"<option value="">{}</option>"#, escape(label)),
        None => String::new(),
    };
    for (value, label) in choices {
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            value,
            if value == selected { " selected" } else { "" },
            label
        ));
    }
    html
}

fn status_options(selected: &str, blank: Option<&str>) -> String {
    options(
        TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
        selected,
        blank,
    )
}

fn priority_options(selected: &str, blank: Option<&str>) -> String {
    options(
        TaskPriority::ALL.iter().map(|p| (p.as_str(), p.label())),
        selected,
        blank,
    )
}

/// Table rows for a task list. Also used by the admin user page.
pub(crate) fn task_rows(tasks: &[Task], linked: bool) -> String {
    if tasks.is_empty() {
        return "<p>No tasks.</p>".to_string();
    }
    let rows: String = tasks
        .iter()
        .map(|task| {
            let title = if linked {
                format!(
                    r#"<a href="{}">{}</a>"#,
                    paths::task(task.id),
                    escape(&task.title)
                )
            } else {
                escape(&task.title)
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                title,
                task.status.label(),
                task.priority.map(|p| p.label()).unwrap_or("-"),
                task.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
        })
        .collect();
    format!(
        "<table>\n<thead><tr><th>Title</th><th>Status</th><th>Priority</th><th>Due</th></tr></thead>\n<tbody>{}</tbody>\n</table>",
        rows
    )
}

pub fn index_page(context: &SessionContext, tasks: &[Task], query: &TaskQuery) -> String {
    let body = format!(
        r#"<h1>Tasks</h1>
<p><a href="{new}">New task</a></p>
<form method="get" action="{action}">
  <select name="status">{status}</select>
  <select name="priority">{priority}</select>
  <input type="search" name="search" value="{search}" placeholder="Search">
  <button type="submit">Filter</button>
</form>
{rows}"#,
        new = paths::NEW_TASK,
        action = paths::TASKS,
        status = status_options(query.status.as_deref().unwrap_or(""), Some("Any status")),
        priority = priority_options(query.priority.as_deref().unwrap_or(""), Some("Any priority")),
        search = escape(query.search.as_deref().unwrap_or("")),
        rows = task_rows(tasks, true),
    );
    layout("Tasks", context, &body)
}

pub fn show_page(context: &SessionContext, task: &Task) -> String {
    let body = format!(
        r#"<h1>{title}</h1>
<p>{description}</p>
<dl>
  <dt>Status</dt><dd>{status}</dd>
  <dt>Priority</dt><dd>{priority}</dd>
  <dt>Due</dt><dd>{due}</dd>
</dl>
<p><a href="{edit}">Edit</a> <a href="{back}">Back</a></p>
{delete}"#,
        title = escape(&task.title),
        description = escape(task.description.as_deref().unwrap_or("")),
        status = task.status.label(),
        priority = task.priority.map(|p| p.label()).unwrap_or("-"),
        due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
        edit = paths::edit_task(task.id),
        back = paths::TASKS,
        delete = delete_button(context, &paths::task(task.id), "Delete", "Are you sure?"),
    );
    layout(&task.title, context, &body)
}

/// New and edit forms. `action` is the path the form posts to.
pub fn form_page(
    context: &SessionContext,
    heading: &str,
    action: &str,
    form: &TaskForm,
    errors: &[String],
) -> String {
    let body = format!(
        r#"<h1>{heading}</h1>
{errors}
<form method="post" action="{action}">
  {csrf}
  <label>Title <input type="text" name="title" value="{title}" maxlength="200" required></label>
  <label>Description <textarea name="description">{description}</textarea></label>
  <label>Priority <select name="priority">{priority}</select></label>
  <label>Status <select name="status">{status}</select></label>
  <label>Due date <input type="date" name="due_date" value="{due_date}"></label>
  <button type="submit">Save</button>
</form>
<p><a href="{back}">Back</a></p>"#,
        heading = escape(heading),
        errors = error_list(errors),
        action = escape(action),
        csrf = csrf_field(context),
        title = escape(&form.title),
        description = escape(&form.description),
        priority = priority_options(&form.priority, Some("None")),
        status = status_options(&form.status, None),
        due_date = escape(&form.due_date),
        back = paths::TASKS,
    );
    layout(heading, context, &body)
}
