//! Middleware modules.
//!
//! The post routes run behind an ordered list of interceptor stages, each of
//! which may answer the request itself:
//! 1. [`HttpsRedirect`] - plain HTTP is redirected.
//! 2. [`ResponseCache`] - stored read responses are replayed.
//! 3. [`Authorization`] - writes without a valid bearer token are rejected.

pub mod auth;
pub mod error;
pub mod https;
pub mod response_cache;

pub use auth::{Authorization, Identity};
pub use https::HttpsRedirect;
pub use response_cache::ResponseCache;

/// The interceptor stages applied in front of the post routes.
#[derive(Clone)]
pub struct Stages {
    pub https: HttpsRedirect,
    pub cache: ResponseCache,
    pub authorization: Authorization,
}
