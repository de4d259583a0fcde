//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Google Sheets (endpoints report "Server not configured" without them)
//! - `SHEET_ID` - Spreadsheet id
//! - `GOOGLE_SHEETS_API_KEY` - Sheets API key
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `GOOGLE_SHEETS_API_BASE` - Sheets API base (default: <https://sheets.googleapis.com>)
//! - `STORES_SHEET_NAME` - Store tab (default: Stores)
//! - `REQUESTS_SHEET_NAME` - Product request tab (default: `ProductRequests`)
//! - `SHEETS_CACHE_TTL_SECS` - Listing cache TTL (default: 60)
//! - `STORE_REFRESH_SECS` - Store locator refresh interval (default: 300)
//! - `REQUEST_SCRIPT_URL` / `REQUEST_WEBHOOK_URL` - Product request downstream
//! - `CONTACT_SCRIPT_URL` / `CONTACT_WEBHOOK_URL` - Contact form downstream
//! - `SIGNUP_SCRIPT_URL` / `SIGNUP_WEBHOOK_URL` - Age-gate signup downstream
//! - `CONTACT_RECIPIENT_EMAIL` - Address shown when the contact form fails
//! - `SITE_DEV_MODE` - Log product requests instead of failing when unconfigured
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::forwarder::SubmissionTarget;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_RECIPIENT_EMAIL: &str = "info@dabscannabis.com";

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
}

/// Site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Spreadsheet access; `None` when `SHEET_ID` or the API key is unset
    pub sheets: Option<SheetsConfig>,
    /// Sheets API base URL, without a trailing slash
    pub sheets_api_base: String,
    pub stores_sheet: String,
    pub requests_sheet: String,
    /// TTL of the cached sheet listings
    pub cache_ttl: Duration,
    /// Interval of the store locator's background refresh
    pub store_refresh: Duration,
    /// Product request downstream; `None` means requests fail as misconfigured
    pub request_target: Option<SubmissionTarget>,
    pub contact_target: SubmissionTarget,
    pub signup_target: SubmissionTarget,
    pub contact_recipient: String,
    pub dev_mode: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Google Sheets API access.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SheetsConfig {
    pub sheet_id: String,
    pub api_key: SecretString,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("sheet_id", &self.sheet_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the API key looks
    /// like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("SITE_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("SITE_PORT", "3000")?;
        let base_url = get_env_or_default("SITE_BASE_URL", "http://localhost:3000");
        let dev_mode = parse_env_or_default::<bool>("SITE_DEV_MODE", "false")?;

        let sheets = match (
            get_optional_env("SHEET_ID"),
            get_optional_env("GOOGLE_SHEETS_API_KEY"),
        ) {
            (Some(sheet_id), Some(api_key)) => {
                validate_secret_strength(&api_key, "GOOGLE_SHEETS_API_KEY")?;
                Some(SheetsConfig {
                    sheet_id,
                    api_key: SecretString::from(api_key),
                })
            }
            _ => None,
        };

        let sheets_api_base = parse_url(
            "GOOGLE_SHEETS_API_BASE",
            &get_env_or_default("GOOGLE_SHEETS_API_BASE", DEFAULT_SHEETS_API_BASE),
        )?
        .as_str()
        .trim_end_matches('/')
        .to_string();

        let request_target = match get_target("REQUEST")? {
            Some(target) => Some(target),
            None if dev_mode => Some(SubmissionTarget::DevLog),
            None => None,
        };

        Ok(Self {
            host,
            port,
            base_url,
            sheets,
            sheets_api_base,
            stores_sheet: get_env_or_default("STORES_SHEET_NAME", "Stores"),
            requests_sheet: get_env_or_default("REQUESTS_SHEET_NAME", "ProductRequests"),
            cache_ttl: Duration::from_secs(parse_env_or_default("SHEETS_CACHE_TTL_SECS", "60")?),
            store_refresh: nonzero_secs(
                "STORE_REFRESH_SECS",
                parse_env_or_default("STORE_REFRESH_SECS", "300")?,
            )?,
            request_target,
            contact_target: get_target("CONTACT")?.unwrap_or(SubmissionTarget::DevLog),
            signup_target: get_target("SIGNUP")?.unwrap_or(SubmissionTarget::DevLog),
            contact_recipient: get_env_or_default("CONTACT_RECIPIENT_EMAIL", DEFAULT_RECIPIENT_EMAIL),
            dev_mode,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests and tools: no sheets, no downstreams, local bind.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            sheets: None,
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            stores_sheet: "Stores".to_string(),
            requests_sheet: "ProductRequests".to_string(),
            cache_ttl: Duration::from_secs(60),
            store_refresh: Duration::from_secs(300),
            request_target: None,
            contact_target: SubmissionTarget::DevLog,
            signup_target: SubmissionTarget::DevLog,
            contact_recipient: DEFAULT_RECIPIENT_EMAIL.to_string(),
            dev_mode: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// A period in whole seconds; zero is rejected.
fn nonzero_secs(key: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Resolve `{PREFIX}_SCRIPT_URL`, then `{PREFIX}_WEBHOOK_URL`.
fn get_target(prefix: &str) -> Result<Option<SubmissionTarget>, ConfigError> {
    let script_key = format!("{prefix}_SCRIPT_URL");
    if let Some(value) = get_optional_env(&script_key) {
        return Ok(Some(SubmissionTarget::SheetProxy {
            endpoint: parse_url(&script_key, &value)?,
        }));
    }

    let webhook_key = format!("{prefix}_WEBHOOK_URL");
    if let Some(value) = get_optional_env(&webhook_key) {
        return Ok(Some(SubmissionTarget::Webhook {
            url: parse_url(&webhook_key, &value)?,
        }));
    }

    Ok(None)
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

/// Reject API keys copied from setup docs (`YOUR_GOOGLE_API_KEY`) and other
/// low-entropy values.
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
