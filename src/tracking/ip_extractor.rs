//! Client IP extraction from HTTP headers
//!
//! Resolution order:
//! - first entry of `X-Forwarded-For`
//! - `X-Real-IP`, used verbatim
//! - the connection's remote address with the port stripped
//!
//! Proxy headers are trusted unconditionally, so the service is expected to
//! sit behind a proxy that overwrites them.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Extract the client IP address from HTTP headers
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `remote_addr` - The socket remote address, usually `ip:port`
///
/// # Returns
/// The client IP as a string. Never fails: an unparseable remote address is
/// returned as-is.
pub fn extract_client_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    if let Some(ip) = extract_from_x_forwarded_for(headers) {
        return ip;
    }

    if let Some(ip) = header_str(headers, "x-real-ip") {
        return ip.to_string();
    }

    strip_port(remote_addr)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// Take the leftmost (originating client) entry of X-Forwarded-For
fn extract_from_x_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let xff = header_str(headers, "x-forwarded-for")?;
    xff.split(',').next().map(|ip| ip.trim().to_string())
}

/// Strip the port from a `host:port` address
fn strip_port(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }

    // Hostnames or bracketed IPv6 with a port that SocketAddr won't take
    if let Some((host, port)) = addr.rsplit_once(':') {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let bare_ipv6 = !addr.starts_with('[') && host.contains(':');
        if !host.is_empty() && !bare_ipv6 && port.parse::<u16>().is_ok() {
            return host.to_string();
        }
    }

    addr.to_string()
}
