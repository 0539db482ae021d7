//! The resolved identity of a request and the guards that gate pages on it.

use crate::error::AppError;
use crate::models::User;

/// Who is making the current request. Derived from the session's user on every request,
/// never stored.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Regular(User),
    Admin(User),
}

impl Principal {
    pub fn from_user(user: Option<User>) -> Self {
        match user {
            Some(user) if user.admin => Principal::Admin(user),
            Some(user) => Principal::Regular(user),
            None => Principal::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Anonymous => None,
            Principal::Regular(user) | Principal::Admin(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin(_))
    }
}

/// Access guard: any logged-in user.
pub fn require_login(principal: &Principal) -> Result<&User, AppError> {
    match principal {
        Principal::Anonymous => Err(AppError::LoginRequired),
        Principal::Regular(user) | Principal::Admin(user) => Ok(user),
    }
}

/// Role guard for the admin pages.
pub fn require_admin(principal: &Principal) -> Result<&User, AppError> {
    match principal {
        Principal::Anonymous => Err(AppError::LoginRequired),
        Principal::Regular(user) => {
            log::warn!("user {} denied administrator page", user.id);
            Err(AppError::NotAdministrator)
        }
        Principal::Admin(user) => Ok(user),
    }
}

/// Ownership guard for a user's detail page: the owner or any administrator.
pub fn authorize_user_page(principal: &Principal, user_id: i32) -> Result<&User, AppError> {
    match principal {
        Principal::Anonymous => Err(AppError::LoginRequired),
        Principal::Regular(user) if user.id == user_id => Ok(user),
        Principal::Regular(user) => {
            log::warn!("user {} denied detail page of user {}", user.id, user_id);
            Err(AppError::PermissionDenied)
        }
        Principal::Admin(user) => Ok(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32, admin: bool) -> User {
        User {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            password_hash: String::new(),
            admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_user_derives_role() {
        assert!(matches!(Principal::from_user(None), Principal::Anonymous));
        assert!(matches!(
            Principal::from_user(Some(user(1, false))),
            Principal::Regular(_)
        ));
        assert!(Principal::from_user(Some(user(2, true))).is_admin());
    }

    #[test]
    fn test_require_login() {
        assert!(matches!(
            require_login(&Principal::Anonymous),
            Err(AppError::LoginRequired)
        ));
        let regular = Principal::Regular(user(1, false));
        assert_eq!(require_login(&regular).unwrap().id, 1);
    }

    #[test]
    fn test_require_admin() {
        assert!(matches!(
            require_admin(&Principal::Anonymous),
            Err(AppError::LoginRequired)
        ));
        assert!(matches!(
            require_admin(&Principal::Regular(user(1, false))),
            Err(AppError::NotAdministrator)
        ));
        assert_eq!(require_admin(&Principal::Admin(user(2, true))).unwrap().id, 2);
    }

    #[test]
    fn test_authorize_user_page() {
        let regular = Principal::Regular(user(1, false));
        assert!(authorize_user_page(&regular, 1).is_ok());
        assert!(matches!(
            authorize_user_page(&regular, 2),
            Err(AppError::PermissionDenied)
        ));
        assert!(authorize_user_page(&Principal::Admin(user(2, true)), 1).is_ok());
        assert!(matches!(
            authorize_user_page(&Principal::Anonymous, 1),
            Err(AppError::LoginRequired)
        ));
    }
}
