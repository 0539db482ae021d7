pub mod extractors;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod session;

pub use extractors::SessionContext;
pub use middleware::{session_middleware, SessionSettings};
pub use password::{hash_password, verify_password, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use principal::Principal;
pub use session::{session_key, Flash, FlashKind, SessionRecord, StoreSessions, SESSION_COOKIE};
