//! Application configuration parsed from environment variables.
//!
//! `main` loads a `.env` file through `dotenvy` before calling
//! [`Config::from_env`], so local development and deployment read the same
//! variable names.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_IGDB_BASE_URL: &str = "https://api.igdb.com/v4";
pub const DEFAULT_PROFILE_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_PROFILE_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_SEARCH_MIN_CHARS: usize = 2;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: String },
    #[error("invalid value for {var}: {value:?}")]
    Parse { var: String, value: String },
}

/// Backend provider (hosted auth/data service) connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

/// Game catalog API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub client_id: String,
    pub access_token: String,
}

/// Error telemetry settings. Without a DSN, captured errors only reach the log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelemetryConfig {
    pub dsn: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileCacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_PROFILE_CACHE_TTL_SECS),
            capacity: DEFAULT_PROFILE_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub min_chars: usize,
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { min_chars: DEFAULT_SEARCH_MIN_CHARS, debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: BackendConfig,
    pub catalog: CatalogConfig,
    pub telemetry: TelemetryConfig,
    pub profile_cache: ProfileCacheConfig,
    /// Client-side search tuning. The server never reads it; it is consumed
    /// by [`AppContext::from_config`](crate::context::AppContext::from_config).
    pub search: SearchConfig,
    pub http_timeout: Duration,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`
    /// - `IGDB_CLIENT_ID`, `IGDB_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `IGDB_BASE_URL`: default `https://api.igdb.com/v4`
    /// - `SENTRY_DSN`, `SENTRY_AUTH_TOKEN`
    /// - `PORT`: default 3000
    /// - `PROFILE_CACHE_TTL_SECS`: default 300
    /// - `PROFILE_CACHE_CAPACITY`: default 256
    /// - `SEARCH_MIN_CHARS`: default 2 (client context only)
    /// - `SEARCH_DEBOUNCE_MS`: default 300 (client context only)
    /// - `HTTP_TIMEOUT_SECS`: default 15
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an absent required variable and
    /// [`ConfigError::Parse`] for a numeric variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Used by tests so they never
    /// touch the shared process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::Missing { var: key.to_owned() })
        };
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let backend = BackendConfig {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_owned(),
            anon_key: required("SUPABASE_ANON_KEY")?,
        };
        let catalog = CatalogConfig {
            base_url: optional("IGDB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IGDB_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            client_id: required("IGDB_CLIENT_ID")?,
            access_token: required("IGDB_ACCESS_TOKEN")?,
        };
        let telemetry = TelemetryConfig { dsn: optional("SENTRY_DSN"), auth_token: optional("SENTRY_AUTH_TOKEN") };

        let profile_cache = ProfileCacheConfig {
            ttl: Duration::from_secs(parse_or(&lookup, "PROFILE_CACHE_TTL_SECS", DEFAULT_PROFILE_CACHE_TTL_SECS)?),
            capacity: parse_or(&lookup, "PROFILE_CACHE_CAPACITY", DEFAULT_PROFILE_CACHE_CAPACITY)?,
        };
        let search = SearchConfig {
            min_chars: parse_or(&lookup, "SEARCH_MIN_CHARS", DEFAULT_SEARCH_MIN_CHARS)?,
            debounce: Duration::from_millis(parse_or(&lookup, "SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?),
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            backend,
            catalog,
            telemetry,
            profile_cache,
            search,
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Parse { var: key.to_owned(), value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
