//! In-process pub/sub hub for live job progress.
//!
//! Topic-keyed broadcast channels feeding the SSE endpoint. Topics are opaque
//! strings; the scraping domain publishes on `scrape_job:{id}`.
//!
//! # Usage
//!
//! Producers (job execution):
//!   hub.publish("scrape_job:0190...", serde_json::to_value(&view)?).await;
//!
//! Consumers (SSE endpoint, CLI watch):
//!   let rx = hub.subscribe("scrape_job:0190...").await;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Thread-safe, cloneable hub keyed by string topics.
/// Payloads are `serde_json::Value`; publishers serialize their own types.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    /// Hub with 64 buffered messages per topic.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish to a topic. Returns how many subscribers received it.
    pub async fn publish(&self, topic: &str, value: serde_json::Value) -> usize {
        let channels = self.channels.read().await;
        match channels.get(topic) {
            Some(tx) => tx.send(value).unwrap_or(0),
            None => 0,
        }
    }

    /// Whether anyone is listening on `topic` right now.
    ///
    /// Lets publishers skip building a payload nobody will read.
    pub async fn has_subscribers(&self, topic: &str) -> bool {
        let channels = self.channels.read().await;
        channels
            .get(topic)
            .map(|tx| tx.receiver_count() > 0)
            .unwrap_or(false)
    }

    /// Subscribe to a topic, creating its channel on first use.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Drop channels whose subscribers have all gone away.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}
