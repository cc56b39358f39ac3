//! Redis-backed response cache, shared between server instances.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Cmd};

use tt_core::ports::{Cache, CacheError};

const DEFAULT_KEY_PREFIX: &str = "tt-api:";

/// Where the shared response cache lives.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Namespace for this service's entries when Redis is shared.
    pub key_prefix: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// `None` unless `REDIS_URL` is set. `REDIS_CONNECT_TIMEOUT_SECS` and
    /// `REDIS_KEY_PREFIX` override the defaults.
    pub fn from_env() -> Option<Self> {
        let mut config = Self::new(std::env::var("REDIS_URL").ok()?);
        if let Some(secs) = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Ok(prefix) = std::env::var("REDIS_KEY_PREFIX") {
            config.key_prefix = prefix;
        }
        Some(config)
    }
}

/// Whole seconds Redis should keep an entry for: sub-second remainders round
/// up so a short TTL never turns into "no expiry" or an immediate miss.
fn expiry_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

/// `SET key value [EX secs]` for one response entry.
fn set_command(key: &str, value: &str, ttl: Option<Duration>) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if let Some(ttl) = ttl {
        cmd.arg("EX").arg(expiry_secs(ttl));
    }
    cmd
}

/// Redis-backed response cache, shared by every server instance.
///
/// Entries are the serialized responses (body plus ETag) written by the HTTP
/// layer; they expire through Redis `EX`. Read failures count as misses so
/// an unavailable Redis never fails a request.
pub struct RedisCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(
            url = %config.url,
            prefix = %config.key_prefix,
            "Connected to Redis response cache"
        );

        Ok(Self {
            conn,
            key_prefix: config.key_prefix,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let (): () = set_command(&self.key(key), value, ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}
