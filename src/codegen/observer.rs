//! Observers notified after a snippet address has been published.
//!
//! Observers are advisory: they see the outcome but cannot change it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codegen::publisher::Publication;
use crate::error::Result;

/// One publication outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEvent {
    /// Runtime address of the snippet
    pub address: u64,
    pub publication: Publication,
}

pub trait PublishObserver {
    fn on_publish(&mut self, event: &PublishEvent);
}

/// Logs every publication through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PublishObserver for TracingObserver {
    fn on_publish(&mut self, event: &PublishEvent) {
        let address = format!("{:#x}", event.address);
        match &event.publication {
            Publication::ConstantPool { index } => {
                info!(%index, %address, "snippet location set in TOC")
            }
            Publication::Patched { site, words } => {
                info!(%site, words, %address, "snippet location patched into idiom")
            }
            Publication::Unpublished => debug!(%address, "snippet location not referenced"),
        }
    }
}

/// Keeps every event, mostly for tests and dumps.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Vec<PublishEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[PublishEvent] {
        &self.events
    }

    /// Serialize recorded events to a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.events)?)
    }
}

impl PublishObserver for RecordingObserver {
    fn on_publish(&mut self, event: &PublishEvent) {
        self.events.push(event.clone());
    }
}
