//! # TT API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer};
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use api_server::telemetry::{TelemetryConfig, init_telemetry};
use tt_core::ports::TokenService;
use tt_infra::{JwtConfig, JwtTokenService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env and the .env.<APP_ENV> overlay if present
    let environment = AppConfig::load_env_files();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        environment = %environment,
        enforce_https = config.enforce_https,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting TT API Server on {}:{}",
        config.host,
        config.port
    );

    let tokens: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::new(JwtConfig::from_env(&config.environment)));
    let state = AppState::from_config(&config, tokens).await;
    let stages = api_server::build_stages(&config, &state);

    // Start HTTP server
    HttpServer::new(move || {
        let state = state.clone();
        let stages = stages.clone();
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(move |cfg| api_server::configure_app(cfg, state, &stages))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
