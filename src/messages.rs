//! User-facing notices shown through the flash.

pub const LOGIN_REQUIRED: &str = "Login required";
pub const NO_PERMISSION: &str = "You don't have permission!";
pub const NOT_ADMINISTRATOR: &str = "You are not an administrator!";
pub const INVALID_AUTHENTICITY_TOKEN: &str = "Invalid authenticity token";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again later.";

pub const LOGGED_IN: &str = "Logged in!";
pub const LOGGED_OUT: &str = "Logged out!";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ACCOUNT_CREATED: &str = "Account created!";
pub const EMAIL_TAKEN: &str = "Email has already been taken";

pub const USER_CREATED: &str = "User created!";
pub const USER_UPDATED: &str = "User updated!";
pub const USER_DELETED: &str = "User deleted!";
pub const CANNOT_DELETE_SELF: &str = "You cannot delete your own account!";

pub const TASK_CREATED: &str = "Task created!";
pub const TASK_UPDATED: &str = "Task updated!";
pub const TASK_DELETED: &str = "Task deleted!";
