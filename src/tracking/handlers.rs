//! Post-capture handler chain
//!
//! Handlers are invoked in registration order, once per captured event,
//! after the event has been appended to the store. A failing or panicking
//! handler is logged and skipped; the rest of the chain still runs.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use super::models::TrackingEvent;

/// Callback run for every captured event
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &TrackingEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&TrackingEvent) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(&self, event: &TrackingEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Logs one line per captured event
pub struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &TrackingEvent) -> anyhow::Result<()> {
        let ip = event.ip.as_deref().unwrap_or("-");
        info!(path = %event.path, ip = %ip, "Tracking event: {} from {}", event.path, ip);
        Ok(())
    }
}

/// Ordered list of registered handlers
#[derive(Default)]
pub struct HandlerChain {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every handler against `event`, in order
    ///
    /// Each handler runs in its own task so a panic stays contained.
    pub async fn dispatch(&self, event: Arc<TrackingEvent>) {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, handler) in handlers.into_iter().enumerate() {
            let event = Arc::clone(&event);
            let outcome = tokio::spawn(async move { handler.handle(&event).await }).await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(handler = index, error = %err, "tracking handler failed");
                }
                Err(err) if err.is_panic() => {
                    warn!(handler = index, "tracking handler panicked");
                }
                Err(err) => {
                    warn!(handler = index, error = %err, "tracking handler did not complete");
                }
            }
        }
    }
}
