//! Persistence behind a single object-safe trait.
//!
//! `PgStore` is the production backend. `MemoryStore` keeps everything in process and
//! is used when no `DATABASE_URL` is configured and by the test suite.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth::session::SessionRecord;
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFilter, TaskInput, User, UserChanges, UserSummary};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<'a, T> = BoxFuture<'a, Result<T, AppError>>;

pub trait UserStore {
    fn find_user(&self, id: i32) -> StoreResult<'_, Option<User>>;

    /// `email` must already be normalized.
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreResult<'a, Option<User>>;

    /// All users ordered by id, with the number of tasks each owns.
    fn list_users(&self) -> StoreResult<'_, Vec<UserSummary>>;

    /// Fails with `AppError::Conflict` when the email is taken.
    fn create_user(&self, user: NewUser) -> StoreResult<'_, User>;

    /// Returns `None` when the user does not exist.
    fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<'_, Option<User>>;

    /// Deletes the user and their tasks. Returns whether a user was deleted.
    fn delete_user(&self, id: i32) -> StoreResult<'_, bool>;
}

pub trait TaskStore {
    /// Tasks owned by `user_id` that match `filter`, newest first.
    fn list_tasks<'a>(&'a self, user_id: i32, filter: &'a TaskFilter)
        -> StoreResult<'a, Vec<Task>>;

    fn find_task(&self, id: Uuid) -> StoreResult<'_, Option<Task>>;

    fn create_task(&self, task: Task) -> StoreResult<'_, Task>;

    /// Updates a task owned by `user_id`; `None` when there is no such task for that owner.
    fn update_task(&self, id: Uuid, user_id: i32, input: TaskInput)
        -> StoreResult<'_, Option<Task>>;

    /// Deletes a task owned by `user_id`. Returns whether a task was deleted.
    fn delete_task(&self, id: Uuid, user_id: i32) -> StoreResult<'_, bool>;
}

/// Storage for `actix-session` state; see `auth::session::StoreSessions`.
pub trait SessionStore {
    /// Returns the record even when it has expired.
    fn load_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, Option<SessionRecord>>;

    /// Inserts or replaces the session.
    fn save_session<'a>(&'a self, session: &'a SessionRecord) -> StoreResult<'a, ()>;

    fn delete_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, ()>;

    /// Removes sessions that expired before `now`. Returns how many were removed.
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<'_, u64>;
}

pub trait Store: UserStore + TaskStore + SessionStore + Send + Sync {
    /// Short backend name for logs and the health check.
    fn backend(&self) -> &'static str;

    /// Cheap liveness check.
    fn ping(&self) -> StoreResult<'_, ()>;
}

/// Periodically deletes expired sessions in the background. The first sweep runs immediately.
pub fn spawn_session_purge(store: Arc<dyn Store>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match store.purge_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => log::info!("purged {} expired sessions", purged),
                Err(err) => log::error!("failed to purge expired sessions: {}", err),
            }
        }
    })
}
