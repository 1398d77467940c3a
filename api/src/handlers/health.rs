use actix_web::{web, HttpResponse};

use crate::app::AppState;

/// Liveness probe with a count of tracked keys
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let tracked_keys: usize = state.guard.trackers().iter().map(|t| t.len()).sum();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "login-guard",
        "version": env!("CARGO_PKG_VERSION"),
        "rate_limiting_enabled": state.guard.is_enabled(),
        "tracked_keys": tracked_keys,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
