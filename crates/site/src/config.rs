//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local supplier catalog on
//! port 3001.
//!
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_BASE_URL` - Public URL for the site (default: <http://localhost:3000>)
//! - `CATALOG_URL` - Supplier storefront URL, framed and used for login
//!   (default: <http://localhost:3001/>)
//! - `CATALOG_IMAGE_BASE_URL` - Prefix for cart item images (default: `CATALOG_URL`)
//! - `CATALOG_TRUSTED_ORIGINS` - Extra comma-separated origins allowed to post cart messages
//! - `CATALOG_LOGIN_TIMEOUT_SECS` - Login request timeout (default: 15)
//! - `PAGE_IDLE_MINUTES` - How long an idle page keeps its punch-out state
//!   (default: 30, at most one year)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use mechanic_shop_core::OriginAllowList;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Supplier catalog configuration
    pub catalog: CatalogConfig,
    /// Idle time after which a page and its punch-out state are dropped
    pub page_idle: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Supplier punch-out catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Storefront URL shown in the frame; the login endpoint lives on it too
    pub url: Url,
    /// Prefix prepended to cart item image paths
    pub image_base_url: Url,
    /// Extra origins allowed to post punch-out messages
    pub extra_trusted_origins: Vec<Url>,
    /// Timeout for the login request
    pub login_timeout: Duration,
}

impl CatalogConfig {
    /// Create a catalog configuration with defaults for everything but the URL.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            image_base_url: url.clone(),
            url,
            extra_trusted_origins: Vec::new(),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
        }
    }

    /// Origins whose frame messages are trusted: the catalog's plus the extras.
    #[must_use]
    pub fn trusted_origins(&self) -> OriginAllowList {
        OriginAllowList::new(std::iter::once(&self.url).chain(&self.extra_trusted_origins))
    }

    /// Origin of the catalog, for the CSP `frame-src` directive.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    fn from_env() -> Result<Self, ConfigError> {
        let url = parse_url(
            "CATALOG_URL",
            &get_env_or_default("CATALOG_URL", DEFAULT_CATALOG_URL),
        )?;
        let image_base_url = match get_optional_env("CATALOG_IMAGE_BASE_URL") {
            Some(value) => parse_url("CATALOG_IMAGE_BASE_URL", &value)?,
            None => url.clone(),
        };
        let extra_trusted_origins = parse_url_list(
            "CATALOG_TRUSTED_ORIGINS",
            &get_env_or_default("CATALOG_TRUSTED_ORIGINS", ""),
        )?;
        let login_timeout = Duration::from_secs(parse_number(
            "CATALOG_LOGIN_TIMEOUT_SECS",
            &get_env_or_default(
                "CATALOG_LOGIN_TIMEOUT_SECS",
                &DEFAULT_LOGIN_TIMEOUT_SECS.to_string(),
            ),
        )?);

        Ok(Self {
            url,
            image_base_url,
            extra_trusted_origins,
            login_timeout,
        })
    }
}

const DEFAULT_CATALOG_URL: &str = "http://localhost:3001/";
const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PAGE_IDLE_MINUTES: u64 = 30;
/// One year. The page cache cannot hold entries idle for much longer.
const MAX_PAGE_IDLE_MINUTES: u64 = 60 * 24 * 365;

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("SITE_BASE_URL", "http://localhost:3000");
        let catalog = CatalogConfig::from_env()?;
        let page_idle = parse_idle_minutes(
            "PAGE_IDLE_MINUTES",
            &get_env_or_default("PAGE_IDLE_MINUTES", &DEFAULT_PAGE_IDLE_MINUTES.to_string()),
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            page_idle,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        })
    }

    /// Configuration for a given catalog with every other value defaulted.
    ///
    /// Used by tests and local tooling that do not read the environment.
    #[must_use]
    pub fn with_catalog(catalog: CatalogConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog,
            page_idle: Duration::from_secs(DEFAULT_PAGE_IDLE_MINUTES * 60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a comma-separated list of URLs, skipping blanks.
fn parse_url_list(key: &str, value: &str) -> Result<Vec<Url>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_url(key, s))
        .collect()
}

/// Parse a positive integer.
fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    let n = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if n == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(n)
}

/// Parse an idle time given in minutes.
fn parse_idle_minutes(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let minutes = parse_number(key, value)?;
    if minutes > MAX_PAGE_IDLE_MINUTES {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be at most {MAX_PAGE_IDLE_MINUTES}"),
        ));
    }
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidEnvVar(key.to_string(), "too large".to_string()))
}
