//! Application configuration loaded from environment variables.
//!
//! `APP_ENV` selects an overlay: `.env` is loaded first, then
//! `.env.<APP_ENV>` if present. Variables already set in the process
//! environment always win.

use std::env;
use std::time::Duration;

#[cfg(feature = "postgres")]
use tt_infra::DatabaseConfig;

const DEFAULT_ENVIRONMENT: &str = "production";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// Redirect plain-HTTP requests on the post routes to HTTPS.
    pub enforce_https: bool,
    /// Lifetime of cached read responses; zero disables the response cache.
    pub cache_ttl: Duration,
    /// Role a bearer token must carry to write posts, if any.
    pub write_role: Option<String>,
}

impl AppConfig {
    /// Load the `.env` overlays for the active environment.
    ///
    /// Returns the environment name so callers can log it once tracing is up.
    pub fn load_env_files() -> String {
        dotenvy::dotenv().ok();

        let environment = Self::environment();
        dotenvy::from_filename(format!(".env.{environment}")).ok();
        environment
    }

    fn environment() -> String {
        env::var("APP_ENV")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let environment = Self::environment();
        let is_development = environment == "development";

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            enforce_https: env::var("ENFORCE_HTTPS")
                .map(|v| parse_flag(&v))
                .unwrap_or(!is_development),
            cache_ttl: Duration::from_secs(
                env::var("RESPONSE_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            write_role: env::var("WRITE_ROLE").ok().filter(|r| !r.is_empty()),
            environment,
        }
    }
}

impl Default for AppConfig {
    /// Local development defaults: in-memory store, no HTTPS redirect.
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            #[cfg(feature = "postgres")]
            database: None,
            enforce_https: false,
            cache_ttl: Duration::from_secs(60),
            write_role: None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("OFF"));
        assert!(!parse_flag("0"));
    }
}
