//! Liveness endpoint.

use actix_web::{HttpResponse, http::header::ContentType};

/// Liveness check - answers `Ok` whenever the process can serve requests.
///
/// The post store is not probed.
///
/// GET /api/healthcheck
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("Ok")
}
