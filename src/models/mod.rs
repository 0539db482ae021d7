pub mod task;
pub mod user;

pub use task::{Task, TaskFilter, TaskForm, TaskInput, TaskPriority, TaskQuery, TaskStatus};
pub use user::{EditUserForm, LoginForm, NewUser, User, UserChanges, UserForm, UserSummary};
