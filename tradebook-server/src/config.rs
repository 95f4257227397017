use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::store::PasswordScheme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("AUTH_CREDENTIALS is not a valid credentials blob: {0}")]
    InvalidCredentials(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Credentials blob carried in AUTH_CREDENTIALS.
#[derive(Debug, Clone, Deserialize)]
struct SheetsCredentials {
    access_token: String,
}

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    /// Env: PORT (default: 8080)
    pub port: u16,

    /// Production mode; gates the HTTPS redirect
    /// Env: PRODUCTION (default: false)
    pub production: bool,

    /// Skip call logging for static assets
    /// Env: FILTER_LOG (default: true)
    pub filter_log: bool,

    /// Trust the `Forwarded` header for the remote host
    /// Env: FORWARDED_ENABLED (default: false)
    pub forwarded_enabled: bool,

    /// Trust `X-Forwarded-For` for the remote host
    /// Env: XFORWARDED_ENABLED (default: false)
    pub xforwarded_enabled: bool,

    /// Host to redirect plain HTTP requests to in production
    /// Env: REDIRECT_HOSTNAME (default: "", disabled)
    pub redirect_hostname: String,

    /// OAuth access token for the Sheets API, taken from AUTH_CREDENTIALS
    /// Env: AUTH_CREDENTIALS (required, JSON `{"access_token": "..."}`)
    pub access_token: String,

    /// Spreadsheet holding every dataset
    /// Env: SPREADSHEET_ID (required)
    pub spreadsheet_id: String,

    /// Env: USERS_RANGE (default: "Users!A2:B")
    pub users_range: String,

    /// Env: UNITS_RANGE (default: "Units!A2:B")
    pub units_range: String,

    /// Env: TRADES_RANGE (default: "Trades!A:C")
    pub trades_range: String,

    /// How stored passwords are compared
    /// Env: PASSWORD_SCHEME (default: "plaintext", or "sha256")
    pub password_scheme: PasswordScheme,

    /// Env: SHEETS_BASE_URL (default: "https://sheets.googleapis.com")
    pub sheets_base_url: String,

    /// Directory served under /static
    /// Env: STATIC_DIR (default: "static")
    pub static_dir: String,

    /// Request body size limit in bytes
    /// Env: REQUEST_BODY_LIMIT (default: 1048576 = 1MB)
    pub request_body_limit: usize,

    /// Request timeout in seconds, also applied to Sheets API calls
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv(); //for local runs mostly
        let defaults = Self::default();

        let credentials = var("AUTH_CREDENTIALS").map_err(|_| ConfigError::Missing("AUTH_CREDENTIALS"))?;
        let spreadsheet_id = var("SPREADSHEET_ID").map_err(|_| ConfigError::Missing("SPREADSHEET_ID"))?;

        let password_scheme = match var("PASSWORD_SCHEME") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PASSWORD_SCHEME", value })?,
            Err(_) => defaults.password_scheme,
        };

        Ok(Self {
            port: env_or_default("PORT", defaults.port),
            production: env_flag("PRODUCTION", defaults.production),
            filter_log: env_flag("FILTER_LOG", defaults.filter_log),
            forwarded_enabled: env_flag("FORWARDED_ENABLED", defaults.forwarded_enabled),
            xforwarded_enabled: env_flag("XFORWARDED_ENABLED", defaults.xforwarded_enabled),
            redirect_hostname: env_or_default_string("REDIRECT_HOSTNAME", ""),
            access_token: parse_access_token(&credentials)?,
            spreadsheet_id,
            users_range: env_or_default_string("USERS_RANGE", &defaults.users_range),
            units_range: env_or_default_string("UNITS_RANGE", &defaults.units_range),
            trades_range: env_or_default_string("TRADES_RANGE", &defaults.trades_range),
            password_scheme,
            sheets_base_url: env_or_default_string("SHEETS_BASE_URL", &defaults.sheets_base_url),
            static_dir: env_or_default_string("STATIC_DIR", &defaults.static_dir),
            request_body_limit: env_or_default("REQUEST_BODY_LIMIT", defaults.request_body_limit),
            request_timeout: Duration::from_secs(env_or_default("REQUEST_TIMEOUT_SECS", 30)),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            production: false,
            filter_log: true,
            forwarded_enabled: false,
            xforwarded_enabled: false,
            redirect_hostname: String::new(),
            access_token: String::new(),
            spreadsheet_id: String::new(),
            users_range: "Users!A2:B".to_string(),
            units_range: "Units!A2:B".to_string(),
            trades_range: "Trades!A:C".to_string(),
            password_scheme: PasswordScheme::Plaintext,
            sheets_base_url: tradebook_sheets::DEFAULT_BASE_URL.to_string(),
            static_dir: "static".to_string(),
            request_body_limit: 1024 * 1024, // 1 MB
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Pull the access token out of the AUTH_CREDENTIALS blob.
fn parse_access_token(blob: &str) -> Result<String, ConfigError> {
    let credentials: SheetsCredentials =
        serde_json::from_str(blob).map_err(|e| ConfigError::InvalidCredentials(e.to_string()))?;
    if credentials.access_token.trim().is_empty() {
        return Err(ConfigError::InvalidCredentials("empty access_token".to_string()));
    }
    Ok(credentials.access_token)
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag. `true`/`false` in any case; anything else keeps the
/// default and is logged.
fn env_flag(key: &str, default: bool) -> bool {
    match var(key) {
        Ok(val) => parse_flag(&val).unwrap_or_else(|| {
            warn!("Ignoring {}={:?}, expected true or false; using {}", key, val, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}
