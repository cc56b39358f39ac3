//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::web;

use crate::middleware::Stages;
use crate::middleware::error::json_error_handler;

/// Configure all application routes.
///
/// The health check sits outside the post scope so none of the interceptor
/// stages apply to it. Stages wrap the post scope outermost-first.
pub fn configure_routes(cfg: &mut web::ServiceConfig, stages: &Stages) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/api/healthcheck", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .wrap(stages.authorization.clone())
                .wrap(stages.cache.clone())
                .wrap(stages.https)
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::create))
                .route("/{id}", web::get().to(posts::get))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::delete().to(posts::delete)),
        );
}
