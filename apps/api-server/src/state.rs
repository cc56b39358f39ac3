//! Application state - shared across all handlers.
//!
//! Built once at startup by explicit composition: the post service, the
//! payload validator, the response cache and the token service are created
//! here and handed to the routes.

use std::sync::Arc;

use tt_core::ports::{Cache, PostRepository, PostService, TokenService};
use tt_core::services::DefaultPostService;
use tt_core::validation::Validator;
use tt_infra::{InMemoryCache, InMemoryPostRepository};
use tt_shared::PostDto;

#[cfg(feature = "postgres")]
use tt_infra::{DatabaseConnections, PostgresPostRepository};

use crate::config::AppConfig;
use crate::validation::PostValidator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostService>,
    pub validator: Arc<dyn Validator<PostDto>>,
    pub cache: Arc<dyn Cache>,
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Assemble state from explicit parts.
    pub fn new(
        repo: Arc<dyn PostRepository>,
        cache: Arc<dyn Cache>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            posts: Arc::new(DefaultPostService::new(repo)),
            validator: Arc::new(PostValidator),
            cache,
            tokens,
        }
    }

    /// State with the in-memory store and cache.
    pub fn in_memory(tokens: Arc<dyn TokenService>) -> Self {
        Self::new(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryCache::new()),
            tokens,
        )
    }

    /// Build the application state with the implementations the config selects.
    pub async fn from_config(config: &AppConfig, tokens: Arc<dyn TokenService>) -> Self {
        let repo = Self::post_repository(config).await;
        let cache = Self::response_cache().await;

        tracing::info!("Application state initialized");

        Self::new(repo, cache, tokens)
    }

    #[cfg(feature = "postgres")]
    async fn post_repository(config: &AppConfig) -> Arc<dyn PostRepository> {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryPostRepository::new());
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => Arc::new(PostgresPostRepository::new(connections.main)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryPostRepository::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn post_repository(_config: &AppConfig) -> Arc<dyn PostRepository> {
        tracing::info!("Running without postgres feature - using in-memory post store");
        Arc::new(InMemoryPostRepository::new())
    }

    #[cfg(feature = "redis")]
    async fn response_cache() -> Arc<dyn Cache> {
        let Some(config) = tt_infra::RedisConfig::from_env() else {
            return Arc::new(InMemoryCache::new());
        };

        match tt_infra::RedisCache::new(config).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::error!("Failed to connect to Redis: {}. Using in-memory cache.", e);
                Arc::new(InMemoryCache::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn response_cache() -> Arc<dyn Cache> {
        Arc::new(InMemoryCache::new())
    }
}
