#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Server-rendered task manager with session login, an authentication gate in front of"]
#![doc = "every page and role-gated administration of user accounts. The binary (`main.rs`)"]
#![doc = "loads configuration, picks a store and serves the app built by [`build_app`]."]

pub mod auth;
pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod respond;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod views;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, Error,
};

use crate::auth::{session_middleware, SessionSettings};
use crate::state::AppState;

pub use crate::error::AppError;

/// Builds the application: `/health` outside session handling, every page behind the
/// session middleware.
pub fn build_app(
    state: web::Data<AppState>,
    settings: SessionSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let sessions = session_middleware(state.store.clone(), &settings);
    App::new()
        .app_data(state)
        .wrap(Logger::default())
        .service(routes::health::health)
        .service(
            web::scope("")
                .wrap(sessions)
                .configure(routes::config)
                .default_service(web::to(routes::not_found)),
        )
}
