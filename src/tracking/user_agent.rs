//! Browser detection from User-Agent strings

use regex::Regex;
use std::sync::LazyLock;

use super::models::BrowserInfo;

/// Browser signatures in match order.
///
/// Edge user agents also carry a Chrome token, and Chrome carries `Safari/`
/// but never `Version/`, so Edge and Safari must be tested before Chrome.
static BROWSER_SIGNATURES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Edge", r"Edg/(\S+)"),
        ("Firefox", r"Firefox/(\S+)"),
        ("Safari", r"Version/(\S+).*?Safari/"),
        ("Chrome", r"Chrome/(\S+)"),
        ("Opera", r"Opera/(\S+)"),
        ("MSIE", r"MSIE (\S+);"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(pattern).expect("invalid browser signature pattern"),
        )
    })
    .collect()
});

/// Identify the browser and its version token
///
/// Returns `unknown` for an empty string and `other` when no signature
/// matches.
pub fn parse_user_agent(user_agent: &str) -> BrowserInfo {
    if user_agent.is_empty() {
        return BrowserInfo::new("unknown", "");
    }

    BROWSER_SIGNATURES
        .iter()
        .find_map(|(name, regex)| {
            regex
                .captures(user_agent)
                .and_then(|caps| caps.get(1))
                .map(|version| BrowserInfo::new(*name, version.as_str()))
        })
        .unwrap_or_else(|| BrowserInfo::new("other", ""))
}
