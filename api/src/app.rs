//! Application state and factory
//!
//! This module holds the state shared by all workers and builds the
//! Actix-web application around it.

use std::net::IpAddr;
use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse};
use lg_core::LoginGuard;
use lg_shared::ServerConfig;
use tracing_actix_web::TracingLogger;

use crate::error::ApiError;
use crate::handlers::{get_rate_limit_status, health_check, reset_rate_limit};
use crate::middleware::{client_ip, AdminAuth};

/// State shared by every worker
pub struct AppState {
    pub guard: Arc<LoginGuard>,
    pub admin_token: Option<String>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(guard: Arc<LoginGuard>, server: &ServerConfig) -> Self {
        Self {
            guard,
            admin_token: server.admin_token.clone(),
            trust_proxy_headers: server.trust_proxy_headers,
        }
    }

    /// Caller address as seen by the rate limiter
    pub fn origin(&self, req: &HttpRequest) -> Option<IpAddr> {
        client_ip(req, self.trust_proxy_headers)
    }
}

/// Create and configure the application
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<
            impl actix_web::body::MessageBody,
        >,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let admin_auth = AdminAuth::new(app_state.admin_token.clone());

    App::new()
        .app_data(app_state)
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/admin")
                    .wrap(admin_auth)
                    .service(
                        web::resource("/rate-limits")
                            .route(web::get().to(get_rate_limit_status))
                            .route(web::delete().to(reset_rate_limit)),
                    ),
            ),
        )
        .default_service(web::route().to(not_found))
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound)
}
