//! Application configuration

use std::env;
use std::fmt;

use crate::auth::cookie::is_valid_cookie_name;

/// `DATABASE_URL` value that selects the in-memory user store
pub const MEMORY_STORE_URL: &str = "memory:";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub log_format: LogFormat,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Sessions
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,

    // Feature flags
    pub enable_signup: bool,

    // One-time administrator seed
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Credentials for the administrator created on first start
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_format", &self.log_format)
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("enable_signup", &self.enable_signup)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                Ok("text") | Err(_) => LogFormat::Text,
                Ok(_) => return Err(ConfigError::Invalid("LOG_FORMAT must be 'text' or 'json'")),
            },

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Sessions
            session_secret: {
                let secret = env::var("SESSION_SECRET")
                    .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "SESSION_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            session_ttl_hours: {
                let hours: i64 = env::var("SESSION_TTL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("SESSION_TTL_HOURS must be an integer"))?;
                if hours <= 0 {
                    return Err(ConfigError::Invalid("SESSION_TTL_HOURS must be positive"));
                }
                if hours > MAX_SESSION_TTL_HOURS {
                    return Err(ConfigError::Invalid(
                        "SESSION_TTL_HOURS must be at most 8760 (one year)",
                    ));
                }
                hours
            },
            session_cookie_name: {
                let name = env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| "petly_session".to_string());
                if !is_valid_cookie_name(&name) {
                    return Err(ConfigError::Invalid(
                        "SESSION_COOKIE_NAME must be a non-empty cookie token",
                    ));
                }
                name
            },
            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            // Feature flags
            enable_signup: env::var("ENABLE_SIGNUP")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            bootstrap_admin: bootstrap_admin_from_env()?,
        })
    }

    /// Defaults for local development and tests, backed by the in-memory store
    pub fn in_memory(session_secret: impl Into<String>) -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            log_format: LogFormat::Text,
            database_url: MEMORY_STORE_URL.to_string(),
            database_max_connections: 1,
            session_secret: session_secret.into(),
            session_ttl_hours: 24,
            session_cookie_name: "petly_session".to_string(),
            session_cookie_secure: false,
            enable_signup: true,
            bootstrap_admin: None,
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE_URL
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.session_ttl_hours.saturating_mul(3600))
    }
}

fn bootstrap_admin_from_env() -> Result<Option<BootstrapAdmin>, ConfigError> {
    let username = env::var("BOOTSTRAP_ADMIN_USERNAME").ok();
    let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok();
    let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();

    match (username, email, password) {
        (None, None, None) => Ok(None),
        (Some(username), Some(email), Some(password)) => Ok(Some(BootstrapAdmin {
            username,
            email,
            password,
        })),
        _ => Err(ConfigError::Incomplete(
            "BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together",
        )),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Incomplete configuration: {0}")]
    Incomplete(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}
