use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::clients::errors::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.tidal.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://auth.tidal.com/v1/oauth2";
pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime settings for the TIDAL client and the login flow
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
    pub auth_url: String,
    pub country_code: String,
    /// Overrides the default session file location when set
    pub session_file: Option<PathBuf>,
    pub login_timeout: Duration,
}

impl Config {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Config {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            session_file: None,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    // Build the configuration from environment variables (a `.env` file is honored too)
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {path:?}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_id = lookup("TIDAL_CLIENT_ID").ok_or_else(|| {
            Error::ConfigurationError(
                "Missing TIDAL_CLIENT_ID environment variable. Check README.md for details.".into(),
            )
        })?;
        let client_secret = lookup("TIDAL_CLIENT_SECRET").ok_or_else(|| {
            Error::ConfigurationError(
                "Missing TIDAL_CLIENT_SECRET environment variable. Check README.md for details."
                    .into(),
            )
        })?;

        let mut config = Config::new(client_id, client_secret);
        if let Some(url) = lookup("TIDAL_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("TIDAL_AUTH_URL") {
            config.auth_url = url.trim_end_matches('/').to_string();
        }
        if let Some(country) = lookup("TIDAL_COUNTRY_CODE") {
            config.country_code = country;
        }
        config.session_file = lookup("TIDAL_SESSION_FILE").map(PathBuf::from);
        if let Some(secs) = lookup("TIDAL_LOGIN_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::ConfigurationError(format!(
                    "TIDAL_LOGIN_TIMEOUT_SECS must be a number of seconds, got '{secs}'"
                ))
            })?;
            config.login_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
