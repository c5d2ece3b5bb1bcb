//! Storefront configuration loaded from environment variables.
//!
//! Configuration is read once at process start into [`StorefrontConfig`] and
//! handed to each upstream client. Every upstream section is optional: when a
//! section is absent the server still starts and the routes that need it answer
//! `500 "<Service> is not configured"`. A section that is only partly set, or
//! whose URL or secret fails validation, is left out the same way and recorded
//! in [`StorefrontConfig::skipped`] so the binary can warn about it.
//!
//! # Environment Variables
//!
//! ## Server
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for human-readable
//!
//! ## WooCommerce (all three or none)
//! - `WOOCOMMERCE_URL` - Store URL (e.g., <https://shop.example.com>)
//! - `WOOCOMMERCE_CONSUMER_KEY` - REST API consumer key
//! - `WOOCOMMERCE_CONSUMER_SECRET` - REST API consumer secret
//! - `WOOCOMMERCE_GATEWAY_REFUNDS` - `true` to let WooCommerce push refunds to the gateway
//! - `WC_PROXY_MAX_RETRIES` - Retries for the generic proxy (default: 2)
//! - `WC_PROXY_RETRY_DELAY_MS` - First backoff delay in ms (default: 1000)
//!
//! ## JLO returns service
//! - `JLO_API_URL` - Base URL (enables the section)
//! - `JLO_API_KEY` - Bearer key (optional)
//! - `JLO_HUB_NAME`, `JLO_HUB_PHONE`, `JLO_HUB_ADDRESS`, `JLO_HUB_CITY`, `JLO_HUB_STATE` -
//!   Default returns hub (all of name/phone/address or none)
//!
//! ## Paystack
//! - `PAYSTACK_SECRET_KEY` - Secret key (enables the section)
//! - `PAYSTACK_API_URL` - Base URL (default: <https://api.paystack.co>)
//!
//! ## Fez (pickup carrier)
//! - `FEZ_API_URL`, `FEZ_API_KEY` - both or none
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_PAYSTACK_URL: &str = "https://api.paystack.co";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
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
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Incomplete {section} configuration, missing: {}", .missing.join(", "))]
    IncompleteSection {
        section: &'static str,
        missing: Vec<&'static str>,
    },
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Emit JSON log lines
    pub log_json: bool,
    /// WooCommerce REST API
    pub woocommerce: Option<WooCommerceConfig>,
    /// JLO returns and logistics API
    pub jlo: Option<JloConfig>,
    /// Paystack payment API
    pub paystack: Option<PaystackConfig>,
    /// Fez pickup carrier API
    pub fez: Option<FezConfig>,
    /// Retry policy for the generic WooCommerce proxy
    pub proxy_retry: RetryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sections that were set but could not be used
    pub skipped: Vec<SkippedSection>,
}

/// An upstream section left out because its variables were unusable.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSection {
    pub section: &'static str,
    pub reason: String,
}

/// WooCommerce REST API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Store base URL; `/wp-json/wc/v3` is appended by the client
    pub base_url: Url,
    /// REST API consumer key
    pub consumer_key: String,
    /// REST API consumer secret
    pub consumer_secret: SecretString,
    /// Ask WooCommerce to refund through the payment gateway (`api_refund`)
    pub gateway_refunds: bool,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("gateway_refunds", &self.gateway_refunds)
            .finish()
    }
}

/// JLO returns service configuration.
#[derive(Clone)]
pub struct JloConfig {
    /// API base URL
    pub base_url: Url,
    /// Optional bearer key
    pub api_key: Option<SecretString>,
    /// Default returns hub used when a request does not name one
    pub hub: Option<HubConfig>,
}

impl std::fmt::Debug for JloConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JloConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("hub", &self.hub)
            .finish()
    }
}

/// Returns hub contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubConfig {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Paystack configuration.
#[derive(Clone)]
pub struct PaystackConfig {
    /// API base URL
    pub base_url: Url,
    /// Secret key (server-side only)
    pub secret_key: SecretString,
}

impl std::fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("base_url", &self.base_url.as_str())
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Fez carrier configuration.
#[derive(Clone)]
pub struct FezConfig {
    /// API base URL
    pub base_url: Url,
    /// API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for FezConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FezConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Retry settings for transient upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// Source of configuration values, keyed by variable name.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a server setting (bind address, port, proxy
    /// retry policy) is invalid. Unusable upstream sections are not errors;
    /// see [`StorefrontConfig::skipped`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| values.get(key).cloned())
    }

    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = env_or_default(env, "STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env_or_default(env, "STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let log_json = env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        let proxy_retry = RetryConfig {
            max_retries: parse_env(env, "WC_PROXY_MAX_RETRIES", 2)?,
            initial_delay: Duration::from_millis(parse_env(env, "WC_PROXY_RETRY_DELAY_MS", 1000)?),
        };

        let mut skipped = Vec::new();
        let woocommerce = usable("WooCommerce", WooCommerceConfig::from_lookup(env), &mut skipped);
        let jlo = usable("JLO", JloConfig::from_lookup(env, &mut skipped), &mut skipped);
        let paystack = usable("Paystack", PaystackConfig::from_lookup(env), &mut skipped);
        let fez = usable("Fez", FezConfig::from_lookup(env), &mut skipped);

        Ok(Self {
            host,
            port,
            log_json,
            woocommerce,
            jlo,
            paystack,
            fez,
            proxy_retry,
            sentry_dsn: env("SENTRY_DSN"),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
            skipped,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A config with every upstream section absent, bound to localhost.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            log_json: false,
            woocommerce: None,
            jlo: None,
            paystack: None,
            fez: None,
            proxy_retry: RetryConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            skipped: Vec::new(),
        }
    }
}

impl WooCommerceConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(values) = section(
            env,
            "WooCommerce",
            &[
                "WOOCOMMERCE_URL",
                "WOOCOMMERCE_CONSUMER_KEY",
                "WOOCOMMERCE_CONSUMER_SECRET",
            ],
        )?
        else {
            return Ok(None);
        };
        let [url, consumer_key, consumer_secret] = values;

        validate_secret_strength(&consumer_secret, "WOOCOMMERCE_CONSUMER_SECRET")?;

        Ok(Some(Self {
            base_url: parse_url("WOOCOMMERCE_URL", &url)?,
            consumer_key,
            consumer_secret: SecretString::from(consumer_secret),
            gateway_refunds: env("WOOCOMMERCE_GATEWAY_REFUNDS")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
        }))
    }
}

impl JloConfig {
    /// An incomplete hub only drops the hub, not the whole section.
    fn from_lookup(
        env: Lookup<'_>,
        skipped: &mut Vec<SkippedSection>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(url) = env("JLO_API_URL") else {
            return Ok(None);
        };

        let hub = section(
            env,
            "JLO hub",
            &["JLO_HUB_NAME", "JLO_HUB_PHONE", "JLO_HUB_ADDRESS"],
        );
        let hub = usable("JLO hub", hub, skipped).map(|[name, phone, address]| HubConfig {
            name,
            phone,
            address,
            city: env("JLO_HUB_CITY"),
            state: env("JLO_HUB_STATE"),
        });

        Ok(Some(Self {
            base_url: parse_url("JLO_API_URL", &url)?,
            api_key: env("JLO_API_KEY").map(SecretString::from),
            hub,
        }))
    }
}

impl PaystackConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = env("PAYSTACK_SECRET_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&secret_key, "PAYSTACK_SECRET_KEY")?;
        let url = env_or_default(env, "PAYSTACK_API_URL", DEFAULT_PAYSTACK_URL);

        Ok(Some(Self {
            base_url: parse_url("PAYSTACK_API_URL", &url)?,
            secret_key: SecretString::from(secret_key),
        }))
    }
}

impl FezConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Option<Self>, ConfigError> {
        let Some([url, api_key]) = section(env, "Fez", &["FEZ_API_URL", "FEZ_API_KEY"])? else {
            return Ok(None);
        };

        Ok(Some(Self {
            base_url: parse_url("FEZ_API_URL", &url)?,
            api_key: SecretString::from(api_key),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Keep a section if it loaded, otherwise record why it was left out.
fn usable<T>(
    name: &'static str,
    loaded: Result<Option<T>, ConfigError>,
    skipped: &mut Vec<SkippedSection>,
) -> Option<T> {
    loaded.unwrap_or_else(|e| {
        skipped.push(SkippedSection {
            section: name,
            reason: e.to_string(),
        });
        None
    })
}

/// Read an all-or-nothing group of variables.
///
/// Returns `None` when none are set and an error when only some are.
fn section<const N: usize>(
    env: Lookup<'_>,
    name: &'static str,
    keys: &[&'static str; N],
) -> Result<Option<[String; N]>, ConfigError> {
    let values = (*keys).map(|key| env(key));
    let missing: Vec<&'static str> = keys
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if missing.len() == N {
        return Ok(None);
    }
    if !missing.is_empty() {
        return Err(ConfigError::IncompleteSection {
            section: name,
            missing,
        });
    }

    Ok(Some(values.map(Option::unwrap_or_default)))
}

/// Get an environment variable with a default value.
fn env_or_default(env: Lookup<'_>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a numeric environment variable with a default value.
fn parse_env<T: std::str::FromStr>(env: Lookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    env(key).map_or(Ok(default), |v| {
        v.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // API keys issued by WooCommerce and Paystack are long random hex strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Redacted view of which upstream sections are configured.
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub listen: String,
    pub woocommerce: Option<String>,
    pub jlo: Option<String>,
    pub jlo_hub: bool,
    pub paystack: Option<String>,
    pub fez: Option<String>,
    pub proxy_max_retries: u32,
    pub sentry: bool,
    pub skipped: Vec<SkippedSection>,
}

impl From<&StorefrontConfig> for ConfigSummary {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            listen: config.socket_addr().to_string(),
            woocommerce: config.woocommerce.as_ref().map(|c| c.base_url.to_string()),
            jlo: config.jlo.as_ref().map(|c| c.base_url.to_string()),
            jlo_hub: config.jlo.as_ref().is_some_and(|c| c.hub.is_some()),
            paystack: config.paystack.as_ref().map(|c| c.base_url.to_string()),
            fez: config.fez.as_ref().map(|c| c.base_url.to_string()),
            proxy_max_retries: config.proxy_retry.max_retries,
            sentry: config.sentry_dsn.is_some(),
            skipped: config.skipped.clone(),
        }
    }
}
