use std::sync::Arc;

use crate::auth::hash_password;
use crate::store::Store;

/// Shared application state handed to every handler as `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Work factor for new password hashes.
    pub bcrypt_cost: u32,
    /// Hash checked when a login names an unknown email, so that both failures take as long
    /// as a real verification.
    pub dummy_hash: String,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        let dummy_hash =
            hash_password("taskgate-unknown-account", bcrypt_cost).unwrap_or_else(|err| {
                log::error!("failed to prepare login dummy hash: {}", err);
                String::new()
            });
        Self {
            store,
            bcrypt_cost,
            dummy_hash,
        }
    }
}
