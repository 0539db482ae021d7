//! Startup bootstrap of the first administrator account.

use crate::auth::hash_password;
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{NewUser, User};
use crate::store::Store;

/// Creates the configured administrator unless an account with that email already exists.
/// Returns the new user, or `None` when nothing was created.
pub async fn ensure_admin(
    store: &dyn Store,
    seed: &AdminSeed,
    bcrypt_cost: u32,
) -> Result<Option<User>, AppError> {
    let email = normalize_email(&seed.email);
    if let Some(existing) = store.find_user_by_email(&email).await? {
        if !existing.admin {
            log::warn!(
                "ADMIN_EMAIL {} belongs to a non-administrator account; leaving it unchanged",
                email
            );
        }
        return Ok(None);
    }

    let user = store
        .create_user(NewUser {
            name: seed.name.trim().to_string(),
            email,
            password_hash: hash_password(&seed.password, bcrypt_cost)?,
            admin: true,
        })
        .await?;
    log::info!("created administrator {} ({})", user.id, user.email);
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::auth::password::MIN_BCRYPT_COST;
    use crate::store::{MemoryStore, UserStore};

    fn seed() -> AdminSeed {
        AdminSeed {
            name: "admin".to_string(),
            email: "Admin@Example.com".to_string(),
            password: "000000".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_ensure_admin_is_idempotent() {
        let store = MemoryStore::new();

        let created = ensure_admin(&store, &seed(), MIN_BCRYPT_COST)
            .await
            .unwrap()
            .expect("admin should be created");
        assert!(created.admin);
        assert_eq!(created.email, "admin@example.com");
        assert!(verify_password("000000", &created.password_hash).unwrap());

        let again = ensure_admin(&store, &seed(), MIN_BCRYPT_COST).await.unwrap();
        assert!(again.is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }
}
