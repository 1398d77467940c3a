//! Operator endpoints for inspecting and clearing rate limiting state

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::app::AppState;
use crate::dto::{RateLimitQuery, RateLimitStatusResponse, ResetResponse};
use crate::error::ApiResult;

/// GET /api/v1/admin/rate-limits?origin=..&identity=..
pub async fn get_rate_limit_status(
    state: web::Data<AppState>,
    query: web::Query<RateLimitQuery>,
) -> ApiResult<HttpResponse> {
    let (origin, identity) = query.parse()?;

    Ok(HttpResponse::Ok().json(RateLimitStatusResponse {
        enabled: state.guard.is_enabled(),
        status: state.guard.status(origin, identity),
    }))
}

/// DELETE /api/v1/admin/rate-limits?origin=..&identity=..
pub async fn reset_rate_limit(
    state: web::Data<AppState>,
    query: web::Query<RateLimitQuery>,
) -> ApiResult<HttpResponse> {
    let (origin, identity) = query.parse()?;

    let reset = state.guard.reset(origin, identity);
    let account_key = identity.map(|identity| state.guard.account_key(origin, identity).to_string());
    let origin_key = state.guard.origin_key(origin).map(|key| key.to_string());

    info!(
        account_key = ?account_key,
        origin_key = ?origin_key,
        reset = reset,
        "Operator reset rate limiting state"
    );

    Ok(HttpResponse::Ok().json(ResetResponse {
        reset,
        account_key,
        origin_key,
    }))
}
