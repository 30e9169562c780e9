//! Pixel tracking pipeline
//!
//! A pixel request is answered immediately with a 1x1 GIF; the request's
//! attributes are then captured into a [`TrackingEvent`], appended to the
//! in-memory [`EventStore`] and handed to every registered [`EventHandler`].

pub mod extract;
pub mod handlers;
pub mod identity;
pub mod ip_extractor;
pub mod models;
pub mod store;
pub mod tracker;
pub mod user_agent;

pub use handlers::{EventHandler, HandlerChain, LoggingHandler};
pub use ip_extractor::extract_client_ip;
pub use models::{BrowserInfo, GeoInfo, TrackingEvent};
pub use store::EventStore;
pub use tracker::{PixelRequest, PixelTracker, PIXEL_GIF};
