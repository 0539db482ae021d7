use std::fmt;

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest, HttpResponse};
use futures::future::LocalBoxFuture;

use crate::auth::principal::{self, Principal};
use crate::auth::session::{
    csrf_matches, random_token, Flash, CSRF_TOKEN_KEY, FLASH_KEY, USER_ID_KEY,
};
use crate::error::AppError;
use crate::models::User;
use crate::respond::redirect;
use crate::state::AppState;
use crate::store::Store;

/// The current request's view of its session.
///
/// Extracting it resolves the session's user into a `Principal` and takes the pending
/// flash out of the session. Handlers pass it to guards and views; logins, logouts and
/// flashes for the next page are written back through it.
#[derive(Clone)]
pub struct SessionContext {
    pub principal: Principal,
    pub flash: Option<Flash>,
    session: Session,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("principal", &self.principal)
            .field("flash", &self.flash)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(principal: Principal, session: Session) -> Self {
        Self {
            principal,
            flash: None,
            session,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.principal.user()
    }

    pub fn require_login(&self) -> Result<&User, AppError> {
        principal::require_login(&self.principal).map_err(|err| self.flash_gate_error(err))
    }

    pub fn require_admin(&self) -> Result<&User, AppError> {
        principal::require_admin(&self.principal).map_err(|err| self.flash_gate_error(err))
    }

    pub fn authorize_user_page(&self, user_id: i32) -> Result<&User, AppError> {
        principal::authorize_user_page(&self.principal, user_id)
            .map_err(|err| self.flash_gate_error(err))
    }

    /// Gate failures redirect; the explanation travels to the next page as a flash.
    fn flash_gate_error(&self, err: AppError) -> AppError {
        if let Some(flash) = err.gate_flash() {
            self.set_flash(flash);
        }
        err
    }

    /// The session's anti-forgery token, created on first use.
    pub fn csrf_token(&self) -> String {
        if let Ok(Some(token)) = self.session.get::<String>(CSRF_TOKEN_KEY) {
            return token;
        }
        let token = random_token();
        if let Err(err) = self.session.insert(CSRF_TOKEN_KEY, &token) {
            log::error!("failed to store authenticity token: {}", err);
        }
        token
    }

    /// Rejects a form post whose token does not belong to this session.
    pub fn verify_csrf(&self, submitted: &str) -> Result<(), AppError> {
        let expected = self
            .session
            .get::<String>(CSRF_TOKEN_KEY)
            .ok()
            .flatten()
            .unwrap_or_default();
        if csrf_matches(&expected, submitted) {
            Ok(())
        } else {
            log::warn!("rejected form post with invalid authenticity token");
            Err(AppError::InvalidAuthenticityToken)
        }
    }

    /// Leaves `flash` for the next rendered page.
    pub fn set_flash(&self, flash: Flash) {
        if let Err(err) = self.session.insert(FLASH_KEY, &flash) {
            log::error!("failed to store flash message: {}", err);
        }
    }

    /// Redirects to `location`, showing `flash` there.
    pub fn redirect_with(&self, location: &str, flash: Flash) -> HttpResponse {
        self.set_flash(flash);
        redirect(location)
    }

    /// Binds `user_id` to a fresh session key. The old anti-forgery token is dropped.
    pub fn sign_in(&self, user_id: i32) -> Result<(), AppError> {
        self.session.renew();
        self.session.remove(CSRF_TOKEN_KEY);
        self.session
            .insert(USER_ID_KEY, user_id)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        log::info!("user {} signed in", user_id);
        Ok(())
    }

    /// Drops the stored session and starts an empty one under a new key, so a flash can
    /// still be carried to the login page.
    pub fn sign_out(&self) {
        self.session.renew();
        self.session.clear();
    }
}

/// Never fails: a missing, deleted or unreadable user resolves to `Anonymous`.
async fn resolve_principal(store: &dyn Store, user_id: Option<i32>) -> Principal {
    let Some(user_id) = user_id else {
        return Principal::Anonymous;
    };
    match store.find_user(user_id).await {
        Ok(user) => Principal::from_user(user),
        Err(err) => {
            log::error!("failed to resolve session user {}: {}", user_id, err);
            Principal::Anonymous
        }
    }
}

impl FromRequest for SessionContext {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalServerError(
                    "AppState not found in request. Ensure it is registered as app data."
                        .to_string(),
                )
            })?;

            let user_id = session.get::<i32>(USER_ID_KEY).unwrap_or_else(|err| {
                log::warn!("unreadable user id in session: {}", err);
                None
            });
            let principal = resolve_principal(state.store.as_ref(), user_id).await;

            // The pending flash is shown by this request and then gone.
            let flash = match session.get::<Flash>(FLASH_KEY) {
                Ok(Some(flash)) => Some(flash),
                Ok(None) => None,
                Err(err) => {
                    log::warn!("unreadable flash in session: {}", err);
                    None
                }
            };
            if flash.is_some() {
                session.remove(FLASH_KEY);
            }

            Ok(SessionContext {
                principal,
                flash,
                session,
            })
        })
    }
}
