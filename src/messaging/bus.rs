use async_trait::async_trait;

// ============================================================================
// Message Fabric Contract
// ============================================================================
//
// Topic-based pub/sub with at-least-once delivery to independently scaled
// consumer groups. Producers see only `EventPublisher`; consumption is a
// per-transport concern (the in-process broker hands out channel receivers,
// Kafka-style transports own their consumer groups externally).
//
// Delivery guarantees consumers must assume:
// - a message MAY arrive more than once
// - ordering holds per partition key only
// - there is no cross-topic ordering at all
//
// ============================================================================

/// One message as it travels the fabric.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    /// Partition key; equal keys are delivered in publish order.
    pub key: String,
    pub payload: String,
}

/// Producer side of the fabric.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()>;
}
