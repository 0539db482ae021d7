use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures::future::{ready, FutureExt};
use uuid::Uuid;

use super::{SessionStore, Store, StoreResult, TaskStore, UserStore};
use crate::auth::session::SessionRecord;
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFilter, TaskInput, User, UserChanges, UserSummary};

#[derive(Default)]
struct State {
    next_user_id: i32,
    users: BTreeMap<i32, User>,
    tasks: HashMap<Uuid, Task>,
    sessions: HashMap<String, SessionRecord>,
}

/// Process-local store. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut State) -> Result<T, AppError>,
    {
        let mut guard: MutexGuard<'_, State> = self
            .state
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))?;
        f(&mut guard)
    }

    fn run<'a, T, F>(&'a self, f: F) -> StoreResult<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&mut State) -> Result<T, AppError>,
    {
        ready(self.with_state(f)).boxed()
    }

    /// Number of stored sessions, expired ones included.
    pub fn session_count(&self) -> usize {
        self.with_state(|state| Ok(state.sessions.len())).unwrap_or(0)
    }
}

fn email_taken(state: &State, email: &str, except: Option<i32>) -> bool {
    state
        .users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

impl UserStore for MemoryStore {
    fn find_user(&self, id: i32) -> StoreResult<'_, Option<User>> {
        self.run(move |state| Ok(state.users.get(&id).cloned()))
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreResult<'a, Option<User>> {
        self.run(move |state| Ok(state.users.values().find(|u| u.email == email).cloned()))
    }

    fn list_users(&self) -> StoreResult<'_, Vec<UserSummary>> {
        self.run(|state| {
            let summaries = state
                .users
                .values()
                .map(|user| UserSummary {
                    user: user.clone(),
                    task_count: state.tasks.values().filter(|t| t.user_id == user.id).count()
                        as i64,
                })
                .collect();
            Ok(summaries)
        })
    }

    fn create_user(&self, new_user: NewUser) -> StoreResult<'_, User> {
        self.run(move |state| {
            if email_taken(state, &new_user.email, None) {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            state.next_user_id += 1;
            let now = Utc::now();
            let user = User {
                id: state.next_user_id,
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                admin: new_user.admin,
                created_at: now,
                updated_at: now,
            };
            state.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<'_, Option<User>> {
        self.run(move |state| {
            if !state.users.contains_key(&id) {
                return Ok(None);
            }
            if email_taken(state, &changes.email, Some(id)) {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            let Some(user) = state.users.get_mut(&id) else {
                return Ok(None);
            };
            user.name = changes.name;
            user.email = changes.email;
            if let Some(hash) = changes.password_hash {
                user.password_hash = hash;
            }
            user.admin = changes.admin;
            user.updated_at = Utc::now();
            Ok(Some(user.clone()))
        })
    }

    fn delete_user(&self, id: i32) -> StoreResult<'_, bool> {
        self.run(move |state| {
            let removed = state.users.remove(&id).is_some();
            if removed {
                state.tasks.retain(|_, task| task.user_id != id);
            }
            Ok(removed)
        })
    }
}

impl TaskStore for MemoryStore {
    fn list_tasks<'a>(
        &'a self,
        user_id: i32,
        filter: &'a TaskFilter,
    ) -> StoreResult<'a, Vec<Task>> {
        self.run(move |state| {
            let mut tasks: Vec<Task> = state
                .tasks
                .values()
                .filter(|t| t.user_id == user_id && filter.matches(t))
                .cloned()
                .collect();
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(tasks)
        })
    }

    fn find_task(&self, id: Uuid) -> StoreResult<'_, Option<Task>> {
        self.run(move |state| Ok(state.tasks.get(&id).cloned()))
    }

    fn create_task(&self, task: Task) -> StoreResult<'_, Task> {
        self.run(move |state| {
            state.tasks.insert(task.id, task.clone());
            Ok(task)
        })
    }

    fn update_task(
        &self,
        id: Uuid,
        user_id: i32,
        input: TaskInput,
    ) -> StoreResult<'_, Option<Task>> {
        self.run(move |state| {
            let Some(task) = state.tasks.get_mut(&id).filter(|t| t.user_id == user_id) else {
                return Ok(None);
            };
            task.title = input.title;
            task.description = input.description;
            task.priority = input.priority;
            task.status = input.status;
            task.due_date = input.due_date;
            task.updated_at = Utc::now();
            Ok(Some(task.clone()))
        })
    }

    fn delete_task(&self, id: Uuid, user_id: i32) -> StoreResult<'_, bool> {
        self.run(move |state| {
            let owned = state.tasks.get(&id).is_some_and(|t| t.user_id == user_id);
            if owned {
                state.tasks.remove(&id);
            }
            Ok(owned)
        })
    }
}

impl SessionStore for MemoryStore {
    fn load_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, Option<SessionRecord>> {
        self.run(move |state| Ok(state.sessions.get(key).cloned()))
    }

    fn save_session<'a>(&'a self, session: &'a SessionRecord) -> StoreResult<'a, ()> {
        self.run(move |state| {
            state.sessions.insert(session.key.clone(), session.clone());
            Ok(())
        })
    }

    fn delete_session<'a>(&'a self, key: &'a str) -> StoreResult<'a, ()> {
        self.run(move |state| {
            state.sessions.remove(key);
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<'_, u64> {
        self.run(move |state| {
            let before = state.sessions.len();
            state.sessions.retain(|_, session| !session.is_expired(now));
            Ok((before - state.sessions.len()) as u64)
        })
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> StoreResult<'_, ()> {
        self.run(|_| Ok(()))
    }
}
