use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{SessionStore, Store, StoreResult, TaskStore, UserStore};
use crate::auth::session::SessionRecord;
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFilter, TaskInput, User, UserChanges, UserSummary};

const USER_COLUMNS: &str = "id, name, email, password_hash, admin, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, priority, status, due_date, created_at, updated_at, user_id";

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct SessionRow {
    key: String,
    state: Json<HashMap<String, String>>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord::new(row.key, row.state.0, row.expires_at)
    }
}

impl UserStore for PgStore {
    fn find_user(&self, id: i32) -> StoreResult<'_, Option<User>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreResult<'a, Option<User>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE email = $1",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn list_users(&self) -> StoreResult<'_, Vec<UserSummary>> {
        Box::pin(async move {
            let users = sqlx::query_as::<_, UserSummary>(
                "SELECT u.id, u.name, u.email, u.password_hash, u.admin, u.created_at, u.updated_at, \
                 COUNT(t.id) AS task_count \
                 FROM users u LEFT JOIN tasks t ON t.user_id = u.id \
                 GROUP BY u.id ORDER BY u.id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(users)
        })
    }

    fn create_user(&self, user: NewUser) -> StoreResult<'_, User> {
        Box::pin(async move {
            let created = sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (name, email, password_hash, admin) VALUES ($1, $2, $3, $4) \
                 RETURNING {}",
                USER_COLUMNS
            ))
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.admin)
            .fetch_one(&self.pool)
            .await?;
            Ok(created)
        })
    }

    fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<'_, Option<User>> {
        Box::pin(async move {
            let updated = sqlx::query_as::<_, User>(&format!(
                "UPDATE users \
                 SET name = $1, email = $2, password_hash = COALESCE($3, password_hash), \
                     admin = $4, updated_at = NOW() \
                 WHERE id = $5 \
                 RETURNING {}",
                USER_COLUMNS
            ))
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.admin)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(updated)
        })
    }

    fn delete_user(&self, id: i32) -> StoreResult<'_, bool> {
        Box::pin(async move {
            // tasks.user_id cascades
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}

impl TaskStore for PgStore {
    fn list_tasks<'a>(
        &'a self,
        user_id: i32,
        filter: &'a TaskFilter,
    ) -> StoreResult<'a, Vec<Task>> {
        Box::pin(async move {
            // Conditions for status, priority and search are appended to the owner scope.
            let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
            let mut param_count = 2;
            let mut conditions: Vec<String> = Vec::new();

            if filter.status.is_some() {
                conditions.push(format!("status = ${}", param_count));
                param_count += 1;
            }
            if filter.priority.is_some() {
                conditions.push(format!("priority = ${}", param_count));
                param_count += 1;
            }
            if filter.search.is_some() {
                conditions.push(format!(
                    "(title ILIKE ${0} OR description ILIKE ${0})",
                    param_count
                ));
            }

            if !conditions.is_empty() {
                sql.push_str(" AND ");
                sql.push_str(&conditions.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut query = sqlx::query_as::<_, Task>(&sql).bind(user_id);
            if let Some(status) = filter.status {
                query = query.bind(status);
            }
            if let Some(priority) = filter.priority {
                query = query.bind(priority);
            }
            if let Some(search) = &filter.search {
                query = query.bind(format!("%{}%", escape_like(search)));
            }

            let tasks = query.fetch_all(&self.pool).await?;
            Ok(tasks)
        })
    }

    fn find_task(&self, id: Uuid) -> StoreResult<'_, Option<Task>> {
        Box::pin(async move {
            let task = sqlx::query_as::<_, Task>(&format!(
                "SELECT {} FROM tasks WHERE id = $1",
                TASK_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(task)
        })
    }

    fn create_task(&self, task: Task) -> StoreResult<'_, Task> {
        Box::pin(async move {
            let created = sqlx::query_as::<_, Task>(&format!(
                "INSERT INTO tasks (id, title, description, priority, status, due_date, user_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {}",
                TASK_COLUMNS
            ))
            .bind(task.id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.due_date)
            .bind(task.user_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(created)
        })
    }

    fn update_task(
        &self,
        id: Uuid,
        user_id: i32,
        input: TaskInput,
    ) -> StoreResult<'_, Option<Task>> {
        Box::pin(async move {
            let updated = sqlx::query_as::<_, Task>(&format!(
                "UPDATE tasks \
                 SET title = $1, description = $2, priority = $3, status = $4, due_date = $5, \
                     updated_at = NOW() \
                 WHERE id = $6 AND user_id = $7 \
                 RETURNING {}",
                TASK_COLUMNS
            ))
            .bind(input.title)
            .bind(input.description)
            .bind(input.priority)
            .bind(input.status)
            .bind(input.due_date)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(updated)
        })
    }

    fn delete_task(&self, id: Uuid, user_id: i32) -> StoreResult<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}

impl SessionStore for PgStore {
    fn load_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, Option<SessionRecord>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, SessionRow>(
                "SELECT key, state, expires_at FROM sessions WHERE key = $1",
            )
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(SessionRecord::from))
        })
    }

    fn save_session<'a>(&'a self, session: &'a SessionRecord) -> StoreResult<'a, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO sessions (key, state, expires_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (key) DO UPDATE SET \
                 state = EXCLUDED.state, expires_at = EXCLUDED.expires_at",
            )
            .bind(session.key.as_str())
            .bind(Json(&session.state))
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn delete_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, ()> {
        Box::pin(async move {
            sqlx::query("DELETE FROM sessions WHERE key = $1")
                .bind(key)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
                .bind(now)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
    }
}

impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn ping(&self) -> StoreResult<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
