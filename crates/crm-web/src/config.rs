//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use chrono::Duration;

/// Files read into the environment at startup, in order. Values already set
/// are never overridden, so `.env.local` wins over `.env`.
pub const ENV_FILES: &[&str] = &[".env.local", ".env"];

/// Load the env files that exist.
pub fn load_env_files() {
    for file in ENV_FILES {
        let _ = dotenvy::from_filename(file);
    }
}

/// CRM web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Key every `/api` request must present in the `apikey` header.
    pub api_key: String,
    /// Login session lifetime.
    pub session_ttl: Duration,
    /// Send the session cookie with `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CRM_DATABASE_URL` | SQLite database URL | (required) |
    /// | `CRM_API_KEY` | API key for `/api` | (required) |
    /// | `CRM_ADDR` | Server bind address | `127.0.0.1:3000` |
    /// | `CRM_SESSION_TTL_HOURS` | Session lifetime in hours | `168` |
    /// | `CRM_SECURE_COOKIES` | `true` to mark the session cookie `Secure` | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("CRM_DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;
        let api_key = required("CRM_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let addr = env::var("CRM_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let hours = match env::var("CRM_SESSION_TTL_HOURS") {
            Ok(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            Err(_) => 168,
        };

        let secure_cookies = env::var("CRM_SECURE_COOKIES")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            addr,
            database_url,
            api_key,
            session_ttl: Duration::hours(hours),
            secure_cookies,
        })
    }
}

/// A set, non-blank variable.
fn required(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CRM_DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("CRM_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("Invalid CRM_ADDR format")]
    InvalidAddr,

    #[error("CRM_SESSION_TTL_HOURS must be a positive number of hours")]
    InvalidSessionTtl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
