//! Pixel tracker: ties extraction, storage and handlers together
//!
//! The pixel response is built synchronously and returned right away. The
//! tracking event is captured by a detached task so that extraction, storage
//! and handler latency never reach the client.

use axum::{
    body::Bytes,
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::extract::{
    compute_decay, extract_cookies, extract_domain, extract_query, parse_languages,
    request_host, resolve_referer, DECAY_PARAM,
};
use super::handlers::{EventHandler, HandlerChain};
use super::identity::{assign_identity, set_cookie_header};
use super::ip_extractor::extract_client_ip;
use super::models::{GeoInfo, TrackingEvent};
use super::store::EventStore;
use super::user_agent::parse_user_agent;
use crate::config::{ConfigError, TrackerConfig};

/// 1x1 transparent GIF
pub static PIXEL_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// The parts of a pixel request the capture task needs
///
/// Owned so it can outlive the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct PixelRequest {
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Socket address as `ip:port`, empty when unknown
    pub remote_addr: String,
    /// Path-template variables of the matched route
    pub route_params: HashMap<String, String>,
}

impl PixelRequest {
    pub fn new(uri: Uri, headers: HeaderMap) -> Self {
        Self {
            uri,
            headers,
            ..Default::default()
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub fn with_route_params(mut self, route_params: HashMap<String, String>) -> Self {
        self.route_params = route_params;
        self
    }
}

/// Build the tracking event for one request
pub fn build_event(
    request: &PixelRequest,
    config: &TrackerConfig,
    now: DateTime<Utc>,
) -> TrackingEvent {
    let headers = &request.headers;

    let client_ip = extract_client_ip(headers, &request.remote_addr);
    // Only the top-level ip honours track_ip; geo always carries the address
    let ip = config
        .track_ip
        .then(|| client_ip.clone())
        .filter(|ip| !ip.is_empty());
    let host = request_host(headers, &request.uri);
    let query = extract_query(&request.uri);
    let decay = compute_decay(query.get(DECAY_PARAM).map(String::as_str), now);

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    TrackingEvent {
        cookies: extract_cookies(headers),
        domain: extract_domain(&host),
        host,
        path: request.uri.path().to_string(),
        referer: resolve_referer(headers),
        params: request.route_params.clone(),
        query,
        geo: GeoInfo { ip: client_ip },
        ip,
        decay,
        user_agent: parse_user_agent(user_agent),
        language: parse_languages(accept_language),
        timestamp: now,
    }
}

/// Decrements the in-flight capture count when dropped, panics included
struct InFlightGuard(Arc<watch::Sender<usize>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Pixel tracking service state
///
/// Cloning is cheap; clones share configuration, handlers and storage.
#[derive(Clone)]
pub struct PixelTracker {
    config: Arc<RwLock<Arc<TrackerConfig>>>,
    handlers: Arc<HandlerChain>,
    store: Arc<EventStore>,
    in_flight: Arc<watch::Sender<usize>>,
}

impl PixelTracker {
    /// Create a tracker, rejecting an invalid configuration
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: TrackerConfig) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            config: Arc::new(RwLock::new(Arc::new(config))),
            handlers: Arc::new(HandlerChain::new()),
            store: Arc::new(EventStore::new()),
            in_flight: Arc::new(in_flight),
        }
    }

    /// Replace the whole configuration
    ///
    /// Requests already in progress keep the configuration they started with.
    pub fn configure(&self, config: TrackerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        Ok(())
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<TrackerConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register a handler to run after every captured event
    pub fn use_handler<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.register(handler);
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Snapshot of every captured event in append order
    pub async fn events(&self) -> Vec<Arc<TrackingEvent>> {
        self.store.snapshot().await
    }

    /// Number of capture tasks that have not finished yet
    pub fn pending_captures(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until every capture task spawned so far has finished
    pub async fn drain(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Serve the tracking pixel and schedule the capture
    pub fn handle_pixel(&self, request: PixelRequest) -> Response {
        let config = self.config();

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/gif"));
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

        let identity = assign_identity(&config, &request.headers);
        if let Some(token) = identity.issued.as_deref() {
            match set_cookie_header(&config, token) {
                Ok(cookie) => {
                    headers.insert(header::SET_COOKIE, cookie);
                    debug!(cookie_name = %config.cookie_name, "issued identity cookie");
                }
                Err(err) => {
                    warn!(cookie_name = %config.cookie_name, error = %err, "failed to encode identity cookie");
                }
            }
        }

        self.spawn_capture(request, config);

        (StatusCode::OK, headers, Bytes::from_static(&PIXEL_GIF)).into_response()
    }

    /// Serve every captured event as JSON
    pub async fn handle_stats(&self) -> Response {
        Json(self.events().await).into_response()
    }

    fn spawn_capture(&self, request: PixelRequest, config: Arc<TrackerConfig>) {
        self.in_flight.send_modify(|count| *count += 1);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let tracker = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            tracker.capture(&request, &config).await;
        });
    }

    async fn capture(&self, request: &PixelRequest, config: &TrackerConfig) {
        let event = Arc::new(build_event(request, config, Utc::now()));
        debug!(
            path = %event.path,
            referer = %event.referer,
            browser = %event.user_agent.browser,
            "captured tracking event"
        );

        self.store.append(Arc::clone(&event)).await;
        self.handlers.dispatch(event).await;
    }
}

impl Default for PixelTracker {
    fn default() -> Self {
        Self::with_valid_config(TrackerConfig::default())
    }
}
