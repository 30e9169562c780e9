//! In-memory, append-only event store
//!
//! Events live for the lifetime of the process. There is no eviction, so the
//! store grows without bound.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::TrackingEvent;

#[derive(Default)]
pub struct EventStore {
    events: RwLock<Vec<Arc<TrackingEvent>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event
    ///
    /// Appends are serialized by the write lock; the event becomes visible to
    /// readers only once this returns.
    pub async fn append(&self, event: Arc<TrackingEvent>) {
        self.events.write().await.push(event);
    }

    /// Copy of every event stored so far, in append order
    ///
    /// Later appends do not show up in the returned vector.
    pub async fn snapshot(&self) -> Vec<Arc<TrackingEvent>> {
        self.events.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}
