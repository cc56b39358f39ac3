//! # TT API Server
//!
//! Post CRUD over HTTP on Actix-web. The binary in `main.rs` only loads
//! configuration and starts the server; everything else lives here so the
//! integration tests can build the same application.

pub mod config;
pub mod handlers;
pub mod mapping;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod validation;

use actix_web::web;

use config::AppConfig;
use middleware::{Authorization, HttpsRedirect, ResponseCache, Stages};
use state::AppState;

/// Build the interceptor stages for the post routes from configuration.
pub fn build_stages(config: &AppConfig, state: &AppState) -> Stages {
    Stages {
        https: HttpsRedirect::new(config.enforce_https),
        cache: ResponseCache::new(state.cache.clone(), config.cache_ttl),
        authorization: Authorization::new(state.tokens.clone(), config.write_role.clone()),
    }
}

/// Register state and routes on an Actix service config.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: AppState, stages: &Stages) {
    cfg.app_data(web::Data::new(state));
    handlers::configure_routes(cfg, stages);
}
