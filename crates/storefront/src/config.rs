//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for cookie
//!   security and the social login callback)
//! - `STOREFRONT_SESSION_SECRET` - Session encryption secret (min 32 chars, high entropy)
//! - `COMMERCE_API_URL` - Base URL of the commerce backend (products, cart, orders)
//! - `AUTH_API_URL` - Base URL of the auth service (sign-in, sessions, profile)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `STOREFRONT_LOG_JSON` - Emit JSON logs when set to `true` or `1`
//! - `UPSTREAM_TIMEOUT_SECS` - Timeout for backend API calls (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry traces sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATIC_DIR: &str = "crates/storefront/static";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Session cookie encryption secret
    pub session_secret: SecretString,
    /// Backend API endpoints
    pub upstream: UpstreamConfig,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Emit JSON formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Endpoints of the external services the storefront consumes.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Commerce API base URL
    pub commerce_url: Url,
    /// Auth service base URL
    pub auth_url: Url,
    /// Per-request timeout for both services
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = required_url("STOREFRONT_BASE_URL")?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host: parse_env("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_env("STOREFRONT_PORT", 3000)?,
            base_url,
            session_secret: session_secret("STOREFRONT_SESSION_SECRET")?,
            upstream: UpstreamConfig::from_env()?,
            static_dir: optional_env("STOREFRONT_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            log_json: optional_env("STOREFRONT_LOG_JSON")
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL the auth service sends browsers back to after social
    /// login. The auth service appends `token` to this query string.
    #[must_use]
    pub fn social_callback_url(&self, state: &str) -> String {
        format!(
            "{}/auth/callback?state={}",
            self.base_url,
            urlencoding::encode(state)
        )
    }
}

impl UpstreamConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            commerce_url: required_url("COMMERCE_API_URL")?,
            auth_url: required_url("AUTH_API_URL")?,
            timeout: Duration::from_secs(parse_env(
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Non-empty value of an optional variable.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn required_url(key: &str) -> Result<Url, ConfigError> {
    let value = required_env(key)?;
    parse_http_url(&value).map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

/// Parse an absolute http(s) URL.
fn parse_http_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err("URL must have a host".to_string()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// Load the cookie encryption secret, rejecting short, placeholder or
/// low-entropy values.
fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required_env(key)?;
    check_secret(&value).map_err(|reason| ConfigError::InsecureSecret(key.to_string(), reason))?;
    Ok(SecretString::from(value))
}

fn check_secret(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_SESSION_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_default() += 1;
    }

    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            upstream: UpstreamConfig {
                commerce_url: Url::parse("http://localhost:8000").unwrap(),
                auth_url: Url::parse("http://localhost:8001/api/auth").unwrap(),
                timeout: Duration::from_secs(10),
            },
            static_dir: "static".to_string(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_secret_too_short() {
        let err = check_secret("kQ7#vN2@pL9!").unwrap_err();
        assert!(err.contains("at least 32"));
    }

    #[test]
    fn test_secret_placeholder() {
        let err = check_secret("your-session-key-here-0123456789abcdef").unwrap_err();
        assert!(err.contains("placeholder"));
    }

    #[test]
    fn test_secret_low_entropy() {
        let err = check_secret(&"ab".repeat(20)).unwrap_err();
        assert!(err.contains("entropy"));
    }

    #[test]
    fn test_secret_valid() {
        assert!(check_secret("kQ7#vN2@pL9!zR4$wX8^mB3&cT6*hJ1%dF5)gY0~").is_ok());
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let port: u16 = parse_env("CLACIE_TEST_UNSET_PORT_VAR", 3000).unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://api.clacie.id").is_ok());
        assert!(parse_http_url("http://localhost:8000/v1").is_ok());
        assert!(parse_http_url("ftp://files.clacie.id").is_err());
        assert!(parse_http_url("not a url").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!test_config("http://localhost:3000").secure_cookies());
        assert!(test_config("https://clacie.id").secure_cookies());
    }

    #[test]
    fn test_social_callback_url() {
        assert_eq!(
            test_config("https://clacie.id").social_callback_url("3f9a"),
            "https://clacie.id/auth/callback?state=3f9a"
        );
    }
}
