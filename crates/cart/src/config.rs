//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_API_URL` - Catalog/stock API base URL (default: `http://localhost:3333`)
//! - `CART_API_TOKEN` - Bearer token sent to the API
//! - `CART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CART_CATALOG_CACHE_TTL_SECS` - Product record cache TTL (default: 300)
//! - `CART_CATALOG_CACHE_CAPACITY` - Max cached product records (default: 1000)
//! - `CART_SNAPSHOT_DIR` - Directory for persisted carts (default: `.cartsync`)
//! - `CART_SNAPSHOT_KEY` - Key the cart is stored under (default: `@RocketShoes:cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::snapshot::DEFAULT_SNAPSHOT_KEY;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_SNAPSHOT_DIR: &str = ".cartsync";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog/stock API configuration
    pub api: ApiConfig,
    /// Snapshot persistence configuration
    pub snapshot: SnapshotConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog/stock API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL (e.g., `http://localhost:3333`)
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product records stay cached
    pub cache_ttl: Duration,
    /// Max number of cached product records
    pub cache_capacity: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Directory holding snapshot files
    pub dir: PathBuf,
    /// Key the cart is stored under
    pub key: String,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_or_default(&lookup, "CART_API_URL", DEFAULT_API_URL);
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_URL".to_string(), e.to_string()))?;

        let api = ApiConfig {
            base_url,
            token: get_optional(&lookup, "CART_API_TOKEN").map(SecretString::from),
            timeout: Duration::from_secs(get_u64(&lookup, "CART_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            cache_ttl: Duration::from_secs(get_u64(
                &lookup,
                "CART_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            cache_capacity: get_u64(&lookup, "CART_CATALOG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
        };

        let snapshot = SnapshotConfig {
            dir: PathBuf::from(get_or_default(&lookup, "CART_SNAPSHOT_DIR", DEFAULT_SNAPSHOT_DIR)),
            key: get_or_default(&lookup, "CART_SNAPSHOT_KEY", DEFAULT_SNAPSHOT_KEY),
        };

        Ok(Self {
            api,
            snapshot,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating an empty value as unset.
fn get_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Get a numeric variable with a default value.
fn get_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    get_optional(lookup, key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
