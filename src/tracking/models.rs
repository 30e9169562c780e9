//! Data models for captured tracking events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Browser name and version derived from the User-Agent header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserInfo {
    pub browser: String,
    pub version: String,
}

impl BrowserInfo {
    pub fn new(browser: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            browser: browser.into(),
            version: version.into(),
        }
    }
}

/// Location information for the client
///
/// Echoes the resolved client IP, even when IP tracking is off; no lookup
/// is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub ip: String,
}

/// One record of everything captured from a single pixel request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// All cookies present on the request
    pub cookies: HashMap<String, String>,

    pub host: String,

    pub path: String,

    /// Referring page, `"direct"` when the request carried none
    pub referer: String,

    /// Path-template variables of the matched route
    pub params: HashMap<String, String>,

    /// Query parameters, first value per key
    pub query: HashMap<String, String>,

    /// Client IP, only recorded when IP tracking is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Expiry intent in epoch milliseconds
    pub decay: i64,

    #[serde(rename = "useragent")]
    pub user_agent: BrowserInfo,

    /// Accept-Language tags in header order
    pub language: Vec<String>,

    pub geo: GeoInfo,

    /// Host with the port stripped
    pub domain: String,

    /// Wall-clock time the event was captured
    pub timestamp: DateTime<Utc>,
}
