//! Response cache for read operations.
//!
//! Successful `GET` responses are kept in the [`Cache`] port keyed by resource
//! path and replayed until their TTL runs out. A successful write drops the
//! entries for its own path and for the parent collection.
//!
//! Paths are normalized before use, so every spelling of a post id the router
//! accepts shares one entry. Each invalidation bumps a per-key generation; a
//! read that started before the bump does not store its response.

use actix_web::{
    Error, HttpResponse,
    body::{self, BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{
        Method, StatusCode,
        header::{self, ContentType, HeaderName, HeaderValue},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use tt_core::ports::Cache;

const KEY_PREFIX: &str = "response:";
const X_CACHE: &str = "x-cache";

/// What is stored per cached response.
#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
}

/// Canonical form of a request path: UUID segments in their lowercase
/// hyphenated form, no trailing slash.
fn resource_path(path: &str) -> String {
    path.trim_end_matches('/')
        .split('/')
        .map(|segment| {
            Uuid::parse_str(segment)
                .map(|id| id.to_string())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn cache_key(path: &str) -> String {
    format!("{KEY_PREFIX}{path}")
}

/// Keys a successful write to the normalized `path` makes stale: the path
/// itself and its parent collection.
fn invalidation_keys(path: &str) -> Vec<String> {
    let mut keys = vec![cache_key(path)];
    if let Some((parent, _)) = path.rsplit_once('/')
        && !parent.is_empty()
    {
        keys.push(cache_key(parent));
    }
    keys
}

fn cache_control(ttl: Duration) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

/// Whether the client asked to skip stored responses.
fn bypass_requested(req: &ServiceRequest) -> bool {
    req.headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("no-cache") || v.contains("no-store"))
}

/// Cache port plus the invalidation generations guarding it.
struct ResponseStore {
    cache: Arc<dyn Cache>,
    generations: Mutex<HashMap<String, u64>>,
}

impl ResponseStore {
    fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            generations: Mutex::new(HashMap::new()),
        }
    }

    async fn generation(&self, key: &str) -> u64 {
        self.generations.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Store `raw` unless `key` was invalidated since generation `seen`.
    async fn put_if_current(&self, key: &str, seen: u64, raw: &str, ttl: Duration) -> bool {
        let generations = self.generations.lock().await;
        if generations.get(key).copied().unwrap_or(0) != seen {
            tracing::debug!(key = %key, "Skipping cache write for a response read before a write");
            return false;
        }

        if let Err(e) = self.cache.set(key, raw, Some(ttl)).await {
            tracing::warn!(key = %key, error = %e, "Response cache write failed");
            return false;
        }
        true
    }

    async fn invalidate(&self, keys: &[String]) {
        let mut generations = self.generations.lock().await;
        for key in keys {
            *generations.entry(key.clone()).or_insert(0) += 1;
            if let Err(e) = self.cache.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Response cache invalidation failed");
            }
        }
    }
}

/// Response cache middleware factory. A zero TTL disables caching.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<ResponseStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            store: Arc::new(ResponseStore::new(cache)),
            ttl,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCache
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = ResponseCacheService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResponseCacheService {
            service: Rc::new(service),
            store: self.store.clone(),
            ttl: self.ttl,
        }))
    }
}

pub struct ResponseCacheService<S> {
    service: Rc<S>,
    store: Arc<ResponseStore>,
    ttl: Duration,
}

impl<S, B> Service<ServiceRequest> for ResponseCacheService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let store = self.store.clone();
        let ttl = self.ttl;

        Box::pin(async move {
            if ttl.is_zero() {
                return Ok(service.call(req).await?.map_into_boxed_body());
            }

            let path = resource_path(req.path());
            let key = cache_key(&path);

            if *req.method() == Method::GET {
                if !bypass_requested(&req)
                    && let Some(hit) = lookup(store.cache.as_ref(), &key).await
                {
                    tracing::debug!(path = %path, "Response cache hit");
                    let (http_req, _payload) = req.into_parts();
                    return Ok(ServiceResponse::new(http_req, hit.into_response(ttl)));
                }

                let seen = store.generation(&key).await;
                let res = service.call(req).await?;
                return store_response(&store, &key, seen, ttl, res).await;
            }

            let is_write = !matches!(*req.method(), Method::HEAD | Method::OPTIONS);
            let res = service.call(req).await?;

            if is_write && res.status().is_success() {
                store.invalidate(&invalidation_keys(&path)).await;
            }

            Ok(res.map_into_boxed_body())
        })
    }
}

async fn lookup(cache: &dyn Cache, key: &str) -> Option<CachedResponse> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
            None
        }
    }
}

/// Buffer a fresh `200 OK` response, keep a copy and send it on.
async fn store_response<B>(
    store: &ResponseStore,
    key: &str,
    seen: u64,
    ttl: Duration,
    res: ServiceResponse<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: MessageBody + 'static,
{
    if res.status() != StatusCode::OK {
        return Ok(res.map_into_boxed_body());
    }

    let etag = res
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let (http_req, http_res) = res.into_parts();
    let (head, body) = http_res.into_parts();
    let bytes = body::to_bytes(body).await.map_err(|e| {
        let e: Box<dyn std::error::Error> = e.into();
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;

    match std::str::from_utf8(&bytes) {
        Ok(text) => {
            let entry = CachedResponse {
                body: text.to_string(),
                etag,
            };
            match serde_json::to_string(&entry) {
                Ok(raw) => {
                    store.put_if_current(key, seen, &raw, ttl).await;
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "Response cache encode failed"),
            }
        }
        Err(_) => tracing::debug!(key = %key, "Skipping cache for non-UTF-8 body"),
    }

    let mut http_res = head.set_body(bytes).map_into_boxed_body();
    http_res
        .headers_mut()
        .insert(header::CACHE_CONTROL, cache_control(ttl));
    http_res
        .headers_mut()
        .insert(HeaderName::from_static(X_CACHE), HeaderValue::from_static("MISS"));

    Ok(ServiceResponse::new(http_req, http_res))
}

impl CachedResponse {
    fn into_response(self, ttl: Duration) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        builder
            .content_type(ContentType::json())
            .insert_header((header::CACHE_CONTROL, cache_control(ttl)))
            .insert_header((X_CACHE, HeaderValue::from_static("HIT")));
        if let Some(etag) = self.etag {
            builder.insert_header((header::ETAG, etag));
        }
        builder.body(self.body)
    }
}
