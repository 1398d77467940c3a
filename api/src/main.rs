use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use lg_api::{config::load_config, create_app, telemetry::init_telemetry, AppState};
use lg_core::{AttemptCleanupService, LoginGuard, SystemClock};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = load_config().context("failed to load configuration")?;
    init_telemetry(&config.logging)?;

    info!(environment = %config.environment, "Starting login guard API server");

    // A misconfigured limiter must never accept login traffic
    let guard = LoginGuard::from_config(&config.rate_limit, Arc::new(SystemClock))
        .context("invalid rate limit configuration")?;
    let guard = Arc::new(guard);

    let cleanup_handles: Vec<_> = guard
        .trackers()
        .into_iter()
        .map(|tracker| Arc::new(AttemptCleanupService::new(tracker)).start_background_task())
        .collect();

    if config.server.admin_token.is_none() {
        info!("No admin token configured, operator endpoints are disabled");
    }

    let state = web::Data::new(AppState::new(guard, &config.server));
    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    for handle in cleanup_handles {
        handle.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}
