//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_URL` - Base URL of the catalog backend
//!
//! ## Optional
//! - `STOREFRONT_API_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `STOREFRONT_SESSION_FILE` - Path of the persisted session store
//!   (default: .vitrine/session.json)
//! - `STOREFRONT_PERSIST_REJECTED_SIGN_IN` - Overwrite the stored session
//!   with the raw body of rejected sign-ins (default: false)

use std::path::PathBuf;

use thiserror::Error;

/// Default request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default path of the persisted session store.
pub const DEFAULT_SESSION_FILE: &str = ".vitrine/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog backend API configuration
    pub api: ApiConfig,
    /// Path of the JSON file holding the persisted session
    pub session_file: PathBuf,
    /// When enabled, a rejected sign-in response still overwrites the
    /// persisted session entry with the raw response body. Disabled by
    /// default: a rejection normally leaves both the store and the
    /// in-memory session untouched.
    pub persist_rejected_sign_in: bool,
}

/// Catalog backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the catalog backend (e.g., <https://api.example.com>)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Configuration for a backend at `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("STOREFRONT_API_URL")?;
        let timeout_secs = parse_env(
            "STOREFRONT_API_TIMEOUT_SECS",
            &get_env_or_default(
                "STOREFRONT_API_TIMEOUT_SECS",
                &DEFAULT_API_TIMEOUT_SECS.to_string(),
            ),
        )?;
        let session_file = PathBuf::from(get_env_or_default(
            "STOREFRONT_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let persist_rejected_sign_in = parse_env(
            "STOREFRONT_PERSIST_REJECTED_SIGN_IN",
            &get_env_or_default("STOREFRONT_PERSIST_REJECTED_SIGN_IN", "false"),
        )?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout_secs,
            },
            session_file,
            persist_rejected_sign_in,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable value, naming the variable on failure.
fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_u64() {
        let parsed: u64 = parse_env("TEST_VAR", "45").unwrap();
        assert_eq!(parsed, 45);
    }

    #[test]
    fn test_parse_env_u64_invalid() {
        let result: Result<u64, _> = parse_env("TEST_VAR", "soon");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TEST_VAR"));
        assert!(err.to_string().contains("TEST_VAR"));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env::<bool>("TEST_VAR", "true").unwrap());
        assert!(!parse_env::<bool>("TEST_VAR", "false").unwrap());
        assert!(parse_env::<bool>("TEST_VAR", "yes").is_err());
    }

    #[test]
    fn test_api_config_new_uses_default_timeout() {
        let api = ApiConfig::new("http://localhost:3333");
        assert_eq!(api.base_url, "http://localhost:3333");
        assert_eq!(api.timeout_secs, DEFAULT_API_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_env_var_display() {
        let err = ConfigError::MissingEnvVar("STOREFRONT_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: STOREFRONT_API_URL"
        );
    }
}
