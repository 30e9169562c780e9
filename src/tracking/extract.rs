//! Attribute extraction from pixel requests
//!
//! Every function here is pure and total: malformed input degrades to an
//! empty value or a sentinel instead of failing the capture.

use axum::http::{header, uri::Authority, HeaderMap, Uri};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Referer value recorded when the request carries none
pub const DIRECT_REFERER: &str = "direct";

/// Name of the query parameter that controls decay
pub const DECAY_PARAM: &str = "decay";

const DEFAULT_DECAY_SECS: i64 = 5 * 60;

/// Collect every cookie sent with the request
///
/// Later duplicates overwrite earlier ones.
pub fn extract_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(parse_cookie_pair)
        .collect()
}

/// Look up a single cookie by name, first occurrence wins
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(parse_cookie_pair)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

fn parse_cookie_pair(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    Some((name.to_string(), value.to_string()))
}

/// Decode the query string, keeping the first value of repeated keys
pub fn extract_query(uri: &Uri) -> HashMap<String, String> {
    let mut query = HashMap::new();
    if let Some(raw) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    query
}

/// Resolve the referring page from `Referer`, then the `Referrer` misspelling
pub fn resolve_referer(headers: &HeaderMap) -> String {
    [header::REFERER.as_str(), "referrer"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .unwrap_or(DIRECT_REFERER)
        .to_string()
}

/// Compute the decay timestamp in epoch milliseconds
///
/// Without a decay parameter the event decays five minutes from `now`,
/// truncated to whole seconds. Any non-empty value yields `0`; the value
/// itself is not interpreted.
pub fn compute_decay(decay: Option<&str>, now: DateTime<Utc>) -> i64 {
    match decay {
        Some(value) if !value.is_empty() => 0,
        _ => (now.timestamp() + DEFAULT_DECAY_SECS) * 1000,
    }
}

/// Split an Accept-Language header into tags, dropping quality weights
pub fn parse_languages(accept_language: &str) -> Vec<String> {
    accept_language
        .split(',')
        .map(|part| part.split(';').next().unwrap_or_default().trim())
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return the host without its port
///
/// The host is kept as sent, with no case folding or address normalisation.
/// Falls back to the input when it cannot be parsed as a URI authority.
pub fn extract_domain(host: &str) -> String {
    if host.is_empty() {
        return String::new();
    }

    match host.parse::<Authority>() {
        Ok(authority) => authority
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string(),
        Err(_) => host.to_string(),
    }
}

/// Host of the request, preferring the Host header over the URI authority
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}
