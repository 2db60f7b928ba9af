use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::bus::{BusMessage, EventPublisher};

// ============================================================================
// In-Process Broker
// ============================================================================
//
// Topic/consumer-group fan-out over unbounded channels. Backs the demo
// binary and the test suite; production deployments publish through the
// Redpanda client instead and consume with their own group subscriptions.
//
// Semantics mirror the fabric contract: every consumer group subscribed to a
// topic receives its own copy of every message published after it
// subscribed. Publishing to a topic with no groups succeeds and delivers
// nothing.
//
// ============================================================================

#[derive(Default)]
pub struct InProcessBroker {
    // topic -> consumer group -> sender
    topics: Mutex<HashMap<String, HashMap<String, mpsc::UnboundedSender<BusMessage>>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a consumer group to a topic.
    ///
    /// Re-subscribing an existing group replaces its channel (a restarted
    /// consumer instance takes over the group).
    pub fn subscribe(&self, topic: &str, group: &str) -> mpsc::UnboundedReceiver<BusMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics
            .entry(topic.to_string())
            .or_default()
            .insert(group.to_string(), tx);

        tracing::debug!(topic = topic, group = group, "consumer group subscribed");
        rx
    }
}

#[async_trait]
impl EventPublisher for InProcessBroker {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        let message = BusMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        };

        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(groups) = topics.get_mut(topic) {
            // Prune groups whose receiver is gone; delivery to the rest.
            groups.retain(|group, tx| {
                let delivered = tx.send(message.clone()).is_ok();
                if !delivered {
                    tracing::debug!(topic = topic, group = group, "dropping dead consumer group");
                }
                delivered
            });
        }

        tracing::debug!(topic = topic, key = key, "published to in-process broker");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
