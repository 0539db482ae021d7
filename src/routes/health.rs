use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// Health check endpoint
///
/// Returns the status of the service and its store, with a timestamp.
/// Answers `503 Service Unavailable` when the store does not respond.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let store = state.store.backend();
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "store": store,
            "timestamp": Utc::now()
        })),
        Err(err) => {
            log::error!("health check failed: {}", err);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "store": store,
                "timestamp": Utc::now()
            }))
        }
    }
}
