use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Settings read by every pixel request.
///
/// Replaced as a whole through `PixelTracker::configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Never issue the identity cookie
    #[serde(default)]
    pub disable_cookies: bool,
    /// Cookie Max-Age in seconds
    #[serde(default = "TrackerConfig::default_max_age")]
    pub max_age: i64,
    #[serde(default = "TrackerConfig::default_cookie_name")]
    pub cookie_name: String,
    /// Record the client IP on each event
    #[serde(default = "TrackerConfig::default_track_ip")]
    pub track_ip: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cookie name must not be empty")]
    EmptyCookieName,
    #[error("cookie name '{0}' contains characters not allowed in a cookie name")]
    InvalidCookieName(String),
    #[error("cookie max-age must not be negative, got {0}")]
    NegativeMaxAge(i64),
}

impl TrackerConfig {
    const fn default_max_age() -> i64 {
        2_592_000
    }

    fn default_cookie_name() -> String {
        "_tracker".to_string()
    }

    const fn default_track_ip() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }

        // RFC 6265 token: visible ASCII minus separators
        let valid = self.cookie_name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        });
        if !valid {
            return Err(ConfigError::InvalidCookieName(self.cookie_name.clone()));
        }

        if self.max_age < 0 {
            return Err(ConfigError::NegativeMaxAge(self.max_age));
        }

        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            disable_cookies: false,
            max_age: Self::default_max_age(),
            cookie_name: Self::default_cookie_name(),
            track_ip: Self::default_track_ip(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let cookie_name = std::env::var("TRACKER_COOKIE_NAME")
            .unwrap_or_else(|_| TrackerConfig::default_cookie_name());
        let max_age = match std::env::var("TRACKER_COOKIE_MAX_AGE") {
            Ok(v) => v
                .parse::<i64>()
                .context("TRACKER_COOKIE_MAX_AGE must be an integer number of seconds")?,
            Err(_) => TrackerConfig::default_max_age(),
        };

        let tracker = TrackerConfig {
            disable_cookies: env_flag("TRACKER_DISABLE_COOKIES", false),
            max_age,
            cookie_name,
            track_ip: env_flag("TRACKER_TRACK_IP", TrackerConfig::default_track_ip()),
        };
        tracker.validate()?;

        Ok(Config {
            server: ServerConfig { host, port },
            tracker,
        })
    }
}
