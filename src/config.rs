// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::core::scanner::info_scanner::{DEFAULT_REQUEST_TIMEOUT, IPINFO_BASE_URL};
use crate::core::scanner::port_scanner::DEFAULT_CONNECT_TIMEOUT;
use crate::core::scanner::subdomain_scanner::{CRTSH_BASE_URL, DEFAULT_SOURCE_TIMEOUT, OTX_BASE_URL};
use crate::errors::ConfigError;

pub const TOKEN_ENV: &str = "BOT_TOKEN";

const DEFAULT_GROUP_ID: i64 = -1002000171927;
const DEFAULT_JOIN_URL: &str = "https://t.me/fastNetAbdo";
const DEFAULT_LANGUAGE: &str = "en";

/// Runtime settings. Only the bot token is mandatory.
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub group_id: i64,
    pub join_url: String,
    pub default_language: String,
    pub source_timeout: Duration,
    pub port_timeout: Duration,
    pub http_timeout: Duration,
    pub crtsh_url: String,
    pub otx_url: String,
    pub metadata_url: String,
}

// The token stays out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("group_id", &self.group_id)
            .field("join_url", &self.join_url)
            .field("default_language", &self.default_language)
            .field("source_timeout", &self.source_timeout)
            .field("port_timeout", &self.port_timeout)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup(TOKEN_ENV)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken(TOKEN_ENV))?;

        let settings = Self {
            token,
            group_id: parse_or(&lookup, "RECON_GROUP_ID", DEFAULT_GROUP_ID)?,
            join_url: lookup("RECON_JOIN_URL").unwrap_or_else(|| DEFAULT_JOIN_URL.to_string()),
            default_language: lookup("RECON_DEFAULT_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            source_timeout: seconds_or(&lookup, "RECON_SOURCE_TIMEOUT_SECS", DEFAULT_SOURCE_TIMEOUT)?,
            port_timeout: seconds_or(&lookup, "RECON_PORT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT)?,
            http_timeout: seconds_or(&lookup, "RECON_HTTP_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?,
            crtsh_url: lookup("RECON_CRTSH_URL").unwrap_or_else(|| CRTSH_BASE_URL.to_string()),
            otx_url: lookup("RECON_OTX_URL").unwrap_or_else(|| OTX_BASE_URL.to_string()),
            metadata_url: lookup("RECON_METADATA_URL").unwrap_or_else(|| IPINFO_BASE_URL.to_string()),
        };
        debug!(settings = ?settings, "Loaded settings.");
        Ok(settings)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// A whole number of seconds, defaulting to the engine's own budget.
fn seconds_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}
