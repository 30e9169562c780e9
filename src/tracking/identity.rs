//! Identity cookie issuance

use axum::http::{HeaderMap, HeaderValue};
use rand::RngExt;
use sha2::{Digest, Sha256};

use super::extract::find_cookie;
use crate::config::TrackerConfig;

/// Length of an identity token in hex characters
pub const TOKEN_LEN: usize = 32;

/// Outcome of the identity step for one pixel request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityAssignment {
    /// Identity cookie the client already had
    pub presented: Option<String>,
    /// Freshly generated token to set on the response
    pub issued: Option<String>,
}

/// Generate a pseudo-random identity token
///
/// Hashes 16 random bytes and hex-encodes the first half of the digest.
/// Tokens are not registered anywhere, uniqueness is probabilistic.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let seed: [u8; 16] = rng.random();
    let digest = Sha256::digest(seed);
    hex::encode(&digest[..TOKEN_LEN / 2])
}

/// Decide whether the request needs a new identity cookie
pub fn assign_identity(config: &TrackerConfig, headers: &HeaderMap) -> IdentityAssignment {
    let presented = find_cookie(headers, &config.cookie_name);

    let issued = if !config.disable_cookies && presented.is_none() {
        Some(generate_token())
    } else {
        None
    };

    IdentityAssignment { presented, issued }
}

/// Render the `Set-Cookie` header for an issued token
pub fn set_cookie_header(
    config: &TrackerConfig,
    token: &str,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut cookie = format!("{}={}; Path=/", config.cookie_name, token);
    if config.max_age > 0 {
        cookie.push_str(&format!("; Max-Age={}", config.max_age));
    }
    cookie.push_str("; HttpOnly");

    HeaderValue::from_str(&cookie)
}
