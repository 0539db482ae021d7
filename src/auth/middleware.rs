use std::sync::Arc;

use actix_session::{
    config::{CookieContentSecurity, PersistentSession, TtlExtensionPolicy},
    SessionMiddleware,
};
use actix_web::cookie::{time, Key, SameSite};
use chrono::Duration;

use crate::auth::session::{StoreSessions, SESSION_COOKIE};
use crate::store::Store;

/// Cookie and lifetime settings for server-side sessions.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub ttl: Duration,
    pub secure: bool,
}

impl SessionSettings {
    pub fn new(key: Key, ttl: Duration, secure: bool) -> Self {
        Self { key, ttl, secure }
    }
}

/// Session middleware for the page scope.
///
/// The cookie is signed with `settings.key` and only names a record in `store`. A session is
/// written only once something is put into it (an anti-forgery token, a flash, a login), and
/// its expiry is pushed out every time its state changes.
pub fn session_middleware(
    store: Arc<dyn Store>,
    settings: &SessionSettings,
) -> SessionMiddleware<StoreSessions> {
    SessionMiddleware::builder(StoreSessions::new(store), settings.key.clone())
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_content_security(CookieContentSecurity::Signed)
        .cookie_same_site(SameSite::Lax)
        .cookie_http_only(true)
        .cookie_secure(settings.secure)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(time::Duration::seconds(settings.ttl.num_seconds()))
                .session_ttl_extension_policy(TtlExtensionPolicy::OnStateChanges),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extractors::SessionContext;
    use crate::auth::password::MIN_BCRYPT_COST;
    use crate::auth::session::{SessionRecord, USER_ID_KEY};
    use crate::models::NewUser;
    use crate::state::AppState;
    use crate::store::{MemoryStore, SessionStore, UserStore};
    use actix_web::cookie::{Cookie, CookieJar};
    use actix_web::{http::header, test, web, App, HttpResponse};
    use chrono::Utc;
    use std::collections::HashMap;

    fn settings() -> SessionSettings {
        SessionSettings::new(Key::generate(), Duration::hours(1), false)
    }

    /// Signs `session_key` the way the middleware does, so a stored record can be named
    /// directly.
    fn signed_cookie(key: &Key, session_key: &str) -> Cookie<'static> {
        let mut jar = CookieJar::new();
        jar.signed_mut(key)
            .add(Cookie::new(SESSION_COOKIE, session_key.to_string()));
        jar.get(SESSION_COOKIE).cloned().unwrap()
    }

    async fn whoami(context: SessionContext) -> HttpResponse {
        let name = context
            .current_user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        HttpResponse::Ok().body(name)
    }

    /// Like `whoami`, but also hands out an anti-forgery token the way a form page does.
    async fn form(context: SessionContext) -> HttpResponse {
        let token = context.csrf_token();
        let name = context
            .current_user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        HttpResponse::Ok().body(format!("{} {}", name, token))
    }

    async fn sample_user(memory: &MemoryStore) -> i32 {
        memory
            .create_user(NewUser {
                name: "sample".to_string(),
                email: "sample@example.com".to_string(),
                password_hash: "hash".to_string(),
                admin: false,
            })
            .await
            .unwrap()
            .id
    }

    fn session_state(user_id: i32) -> HashMap<String, String> {
        HashMap::from([(USER_ID_KEY.to_string(), user_id.to_string())])
    }

    #[actix_rt::test]
    async fn test_anonymous_request_without_state_stores_nothing() {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn Store> = memory.clone();
        let settings = settings();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(store.clone(), MIN_BCRYPT_COST)))
                .wrap(session_middleware(store, &settings))
                .route("/", web::get().to(whoami))
                .route("/form", web::get().to(form)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(!resp.headers().contains_key(header::SET_COOKIE));
        assert_eq!(test::read_body(resp).await, "anonymous");
        assert_eq!(memory.session_count(), 0);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/form").to_request()).await;
        assert!(resp.headers().contains_key(header::SET_COOKIE));
        assert_eq!(memory.session_count(), 1);
    }

    #[actix_rt::test]
    async fn test_session_naming_deleted_user_resolves_to_anonymous() {
        let memory = Arc::new(MemoryStore::new());
        let user_id = sample_user(&memory).await;
        let settings = settings();
        let record = SessionRecord::new(
            "live-session",
            session_state(user_id),
            Utc::now() + Duration::hours(1),
        );
        memory.save_session(&record).await.unwrap();
        let cookie = signed_cookie(&settings.key, "live-session");

        let store: Arc<dyn Store> = memory.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(store.clone(), MIN_BCRYPT_COST)))
                .wrap(session_middleware(store, &settings))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").cookie(cookie.clone()).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "sample");

        memory.delete_user(user_id).await.unwrap();
        let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_rt::test]
    async fn test_expired_session_resolves_to_anonymous_with_new_cookie() {
        let memory = Arc::new(MemoryStore::new());
        let user_id = sample_user(&memory).await;
        let settings = settings();
        let record = SessionRecord::new(
            "expired-session",
            session_state(user_id),
            Utc::now() - Duration::minutes(5),
        );
        memory.save_session(&record).await.unwrap();
        let cookie = signed_cookie(&settings.key, "expired-session");

        let store: Arc<dyn Store> = memory.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(store.clone(), MIN_BCRYPT_COST)))
                .wrap(session_middleware(store, &settings))
                .route("/form", web::get().to(form)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/form")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        let issued = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .expect("a new session cookie is issued");
        assert_ne!(issued, cookie.value());

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.starts_with("anonymous "));
    }
}
