//! Session state kept in the application store and the keys the app reads from it.
//!
//! `actix-session` owns the cookie and the request-scoped `Session`; `StoreSessions`
//! plugs the app's own `Store` in as its storage backend, so sessions live next to the
//! users they name.

use std::collections::HashMap;
use std::sync::Arc;

use actix_session::storage::{
    LoadError, SaveError, SessionKey, SessionStore as SessionBackend, UpdateError,
};
use actix_web::cookie::{time, Key};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MIN_SESSION_SECRET_LEN;
use crate::store::Store;

pub const SESSION_COOKIE: &str = "taskgate_session";

/// Session key holding the id of the logged-in user.
pub const USER_ID_KEY: &str = "user_id";
/// Session key holding the anti-forgery token; created the first time a form is rendered.
pub const CSRF_TOKEN_KEY: &str = "csrf_token";
/// Session key holding the message for the next rendered page.
pub const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Notice,
    Alert,
}

/// A one-time message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Alert,
            message: message.into(),
        }
    }
}

/// A stored session: its key, the serialized entries and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub key: String,
    pub state: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        key: impl Into<String>,
        state: HashMap<String, String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            state,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 64 hex characters from two random UUIDs; used for session keys and anti-forgery tokens.
pub(crate) fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Constant-time comparison of the session's token against a submitted one.
pub fn csrf_matches(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || expected.len() != submitted.len() {
        return false;
    }
    expected
        .bytes()
        .zip(submitted.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Signing key for session cookies. A missing or short secret yields a per-process random key,
/// so every session is invalidated on restart.
pub fn session_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if secret.len() >= MIN_SESSION_SECRET_LEN => {
            Key::derive_from(secret.as_bytes())
        }
        Some(_) => {
            log::warn!(
                "SESSION_SECRET is shorter than {} bytes; using a random session key",
                MIN_SESSION_SECRET_LEN
            );
            Key::generate()
        }
        None => {
            log::warn!("SESSION_SECRET is not set; using a random session key");
            Key::generate()
        }
    }
}

fn expiry(ttl: &time::Duration) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(ttl.whole_seconds())
}

/// `actix-session` storage backend over the application store.
///
/// Expired records are treated as missing on load and swept by `spawn_session_purge`.
#[derive(Clone)]
pub struct StoreSessions {
    store: Arc<dyn Store>,
}

impl StoreSessions {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl SessionBackend for StoreSessions {
    async fn load(
        &self,
        session_key: &SessionKey,
    ) -> Result<Option<HashMap<String, String>>, LoadError> {
        let record = self
            .store
            .load_session(session_key.as_ref())
            .await
            .map_err(|e| LoadError::Other(anyhow::Error::new(e)))?;
        Ok(record
            .filter(|record| !record.is_expired(Utc::now()))
            .map(|record| record.state))
    }

    async fn save(
        &self,
        session_state: HashMap<String, String>,
        ttl: &time::Duration,
    ) -> Result<SessionKey, SaveError> {
        let key = random_token();
        let session_key = SessionKey::try_from(key.clone())
            .map_err(|_| SaveError::Other(anyhow::anyhow!("generated session key was rejected")))?;
        let record = SessionRecord::new(key, session_state, expiry(ttl));
        self.store
            .save_session(&record)
            .await
            .map_err(|e| SaveError::Other(anyhow::Error::new(e)))?;
        Ok(session_key)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: HashMap<String, String>,
        ttl: &time::Duration,
    ) -> Result<SessionKey, UpdateError> {
        let key: &str = session_key.as_ref();
        let record = SessionRecord::new(key, session_state, expiry(ttl));
        self.store
            .save_session(&record)
            .await
            .map_err(|e| UpdateError::Other(anyhow::Error::new(e)))?;
        Ok(session_key)
    }

    async fn update_ttl(
        &self,
        session_key: &SessionKey,
        ttl: &time::Duration,
    ) -> Result<(), anyhow::Error> {
        if let Some(mut record) = self.store.load_session(session_key.as_ref()).await? {
            record.expires_at = expiry(ttl);
            self.store.save_session(&record).await?;
        }
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> Result<(), anyhow::Error> {
        self.store.delete_session(session_key.as_ref()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SessionStore};

    fn state(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_csrf_matches() {
        let token = random_token();
        assert!(csrf_matches(&token, &token.clone()));
        assert!(!csrf_matches(&token, ""));
        assert!(!csrf_matches(&token, "forged"));
        assert!(!csrf_matches("", ""));
    }

    #[test]
    fn test_session_key_is_stable_for_long_secret() {
        let secret = "s".repeat(MIN_SESSION_SECRET_LEN);
        assert_eq!(
            session_key(Some(&secret)).master(),
            session_key(Some(&secret)).master()
        );
        assert_ne!(
            session_key(Some("short")).master(),
            session_key(Some(&secret)).master()
        );
    }

    #[test]
    fn test_flash_serializes_kind_in_lowercase() {
        let json = serde_json::to_string(&Flash::alert("No")).unwrap();
        assert_eq!(json, r#"{"kind":"alert","message":"No"}"#);
    }

    #[actix_rt::test]
    async fn test_backend_saves_updates_and_deletes() {
        let memory = Arc::new(MemoryStore::new());
        let backend = StoreSessions::new(memory.clone());
        let ttl = time::Duration::hours(1);

        let key = backend.save(state(&[("user_id", "7")]), &ttl).await.unwrap();
        let loaded = backend.load(&key).await.unwrap();
        assert_eq!(loaded, Some(state(&[("user_id", "7")])));

        let key = backend
            .update(key, state(&[("user_id", "8")]), &ttl)
            .await
            .unwrap();
        assert_eq!(backend.load(&key).await.unwrap(), Some(state(&[("user_id", "8")])));
        assert_eq!(memory.session_count(), 1);

        backend.delete(&key).await.unwrap();
        assert_eq!(backend.load(&key).await.unwrap(), None);
        assert_eq!(memory.session_count(), 0);
    }

    #[actix_rt::test]
    async fn test_backend_ignores_expired_records() {
        let memory = Arc::new(MemoryStore::new());
        let backend = StoreSessions::new(memory.clone());

        let stale = SessionRecord::new(
            "stale-session",
            state(&[("user_id", "1")]),
            Utc::now() - Duration::minutes(1),
        );
        memory.save_session(&stale).await.unwrap();
        let key = SessionKey::try_from("stale-session".to_string()).unwrap();
        assert_eq!(backend.load(&key).await.unwrap(), None);

        backend.update_ttl(&key, &time::Duration::hours(1)).await.unwrap();
        assert!(backend.load(&key).await.unwrap().is_some());
    }
}
