#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    cookie::{Cookie, Key},
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, web, Error,
};
use taskgate::{
    auth::{hash_password, SessionSettings, MIN_BCRYPT_COST, SESSION_COOKIE},
    models::{NewUser, User},
    state::AppState,
    store::{MemoryStore, UserStore},
};

pub const PASSWORD: &str = "000000";

/// Shared state for one test app over an in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
    pub settings: SessionSettings,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = web::Data::new(AppState::new(store.clone(), MIN_BCRYPT_COST));
        let settings = SessionSettings::new(Key::generate(), chrono::Duration::hours(24), false);
        Self {
            store,
            state,
            settings,
        }
    }

    pub async fn create_user(&self, name: &str, email: &str, admin: bool) -> User {
        self.store
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD, MIN_BCRYPT_COST).unwrap(),
                admin,
            })
            .await
            .unwrap()
    }
}

/// A rendered response, read to completion.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl Page {
    pub fn location(&self) -> &str {
        self.location.as_deref().expect("response is not a redirect")
    }
}

/// Pulls the anti-forgery token out of the first form on a page.
pub fn authenticity_token(body: &str) -> String {
    let marker = r#"name="authenticity_token" value=""#;
    let start = body.find(marker).expect("page has no authenticity token") + marker.len();
    let end = body[start..].find('"').expect("unterminated token") + start;
    body[start..end].to_string()
}

/// Carries the session cookie from one request to the next, like a browser would.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub fn forget_session(&mut self) {
        self.cookie = None;
    }

    pub async fn send<S, B>(&mut self, app: &S, req: test::TestRequest) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        let req = match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        };
        let resp = test::call_service(app, req.to_request()).await;

        if let Some(cookie) = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
        {
            self.cookie = Some(cookie.into_owned());
        }
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = test::read_body(resp).await;
        Page {
            status,
            location,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    pub async fn get<S, B>(&mut self, app: &S, uri: &str) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        self.send(app, test::TestRequest::get().uri(uri)).await
    }

    pub async fn post<S, B>(&mut self, app: &S, uri: &str, fields: &[(&str, &str)]) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        self.send(app, test::TestRequest::post().uri(uri).set_form(fields))
            .await
    }

    /// Follows the redirect in `page`.
    pub async fn follow<S, B>(&mut self, app: &S, page: &Page) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        let location = page.location().to_string();
        self.get(app, &location).await
    }

    /// Loads `form_page` for its token, then posts `fields` with that token to `action`.
    pub async fn submit<S, B>(
        &mut self,
        app: &S,
        form_page: &str,
        action: &str,
        fields: &[(&str, &str)],
    ) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        let page = self.get(app, form_page).await;
        let token = authenticity_token(&page.body);
        let mut fields = fields.to_vec();
        fields.push(("authenticity_token", token.as_str()));
        self.post(app, action, &fields).await
    }

    pub async fn login<S, B>(&mut self, app: &S, email: &str, password: &str) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        self.submit(
            app,
            "/session/new",
            "/session/new",
            &[("email", email), ("password", password)],
        )
        .await
    }

    /// Deletes through the `_method` override, using a token taken from `token_page`.
    pub async fn delete<S, B>(&mut self, app: &S, token_page: &str, action: &str) -> Page
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody,
    {
        self.submit(app, token_page, action, &[("_method", "delete")])
            .await
    }
}
