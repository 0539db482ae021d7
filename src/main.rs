use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpServer};
use taskgate::{
    auth::{session_key, SessionSettings},
    build_app,
    config::Config,
    seed,
    state::AppState,
    store::{spawn_session_purge, MemoryStore, PgStore, Store},
};

const SESSION_PURGE_PERIOD: Duration = Duration::from_secs(60 * 60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(
            PgStore::connect(url)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
        ),
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(admin) = &config.admin_seed {
        seed::ensure_admin(store.as_ref(), admin, config.bcrypt_cost)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }

    spawn_session_purge(store.clone(), SESSION_PURGE_PERIOD);

    let settings = SessionSettings::new(
        session_key(config.session_secret.as_deref()),
        chrono::Duration::hours(config.session_ttl_hours),
        config.secure_cookies,
    );
    let state = web::Data::new(AppState::new(store.clone(), config.bcrypt_cost));

    log::info!(
        "starting taskgate at {} with the {} store",
        config.server_url(),
        store.backend()
    );
    HttpServer::new(move || build_app(state.clone(), settings.clone()))
        .bind((config.server_host.as_str(), config.server_port))?
        .run()
        .await
}
