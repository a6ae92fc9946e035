//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target the production backend.
//!
//! - `CARPET_API_BASE_URL` - REST API base URL
//!   (default: `https://tcc-backend-tkku.onrender.com/api/v1`)
//! - `CARPET_STORAGE_DIR` - Directory for persisted client state (default: `.carpet`)
//! - `CARPET_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CARPET_CACHE_TTL_SECS` - Product cache time-to-live (default: 300)
//! - `CARPET_REDIRECT_TIMEOUT_SECS` - How long to wait for a pending
//!   identity-provider redirect to complete (default: 15)
//! - `CARPET_CART_MERGE_POLICY` - What to do with the anonymous cart on
//!   sign-in: `merge` or `discard` (default: `merge`)
//! - `CARPET_CURRENCY` - Display currency (default: `INR`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use carpet_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Production API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://tcc-backend-tkku.onrender.com/api/v1";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What happens to anonymous cart and wishlist contents on sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Push anonymous lines to the server cart, then clear local storage.
    #[default]
    Merge,
    /// Drop anonymous lines.
    Discard,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected `merge` or `discard`, got `{other}`")),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST API base URL (no trailing slash)
    pub api_base_url: Url,
    /// Directory holding persisted client state
    pub storage_dir: PathBuf,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Product cache TTL
    pub cache_ttl: Duration,
    /// Upper bound on waiting for a pending sign-in redirect
    pub redirect_timeout: Duration,
    /// Anonymous-to-signed-in cart policy
    pub merge_policy: MergePolicy,
    /// Display currency
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_env_or_default(
            "CARPET_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))?;
        let storage_dir = PathBuf::from(get_env_or_default("CARPET_STORAGE_DIR", ".carpet"));
        let http_timeout = get_duration_secs("CARPET_HTTP_TIMEOUT_SECS", 30)?;
        let cache_ttl = get_duration_secs("CARPET_CACHE_TTL_SECS", 300)?;
        let redirect_timeout = get_duration_secs("CARPET_REDIRECT_TIMEOUT_SECS", 15)?;
        let merge_policy = get_parsed("CARPET_CART_MERGE_POLICY", MergePolicy::Merge)?;
        let currency = get_parsed("CARPET_CURRENCY", CurrencyCode::INR)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            storage_dir,
            http_timeout,
            cache_ttl,
            redirect_timeout,
            merge_policy,
            currency,
            sentry_dsn,
        })
    }

    /// Configuration pointing at a specific API, with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn for_api(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            storage_dir: PathBuf::from(".carpet"),
            http_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            redirect_timeout: Duration::from_secs(15),
            merge_policy: MergePolicy::default(),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
        })
    }

    /// Builds an absolute endpoint URL from a path such as `/cart/add`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("CARPET_API_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CARPET_API_BASE_URL".to_string(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get a required environment variable.
#[allow(dead_code)]
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional variable with `FromStr`, falling back to `default`.
fn get_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn get_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = get_parsed(key, default_secs)?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_production() {
        let config = StorefrontConfig::for_api(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(config.api_base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.redirect_timeout, Duration::from_secs(15));
        assert_eq!(config.merge_policy, MergePolicy::Merge);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = StorefrontConfig::for_api("http://127.0.0.1:9000/api/v1/").unwrap();
        assert_eq!(config.endpoint("/cart/add"), "http://127.0.0.1:9000/api/v1/cart/add");
        assert_eq!(config.endpoint("products"), "http://127.0.0.1:9000/api/v1/products");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = StorefrontConfig::for_api("ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!("MERGE".parse::<MergePolicy>(), Ok(MergePolicy::Merge));
        assert_eq!(" discard ".parse::<MergePolicy>(), Ok(MergePolicy::Discard));
        assert!("keep".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_get_parsed_reports_key() {
        // Unset keys fall back to the default without touching the environment.
        let value: u64 = get_parsed("CARPET_TEST_SURELY_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }
}
