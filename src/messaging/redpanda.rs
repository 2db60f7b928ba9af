use anyhow::Result;
use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};

use super::bus::EventPublisher;

// ============================================================================
// Redpanda Producer (feature `redpanda`)
// ============================================================================
//
// Kafka-protocol producer used by the outbox dispatcher in production
// deployments. Backoff and circuit breaking live in the dispatcher, which
// wraps every publisher the same way.
//
// ============================================================================

pub struct RedpandaClient {
    producer: FutureProducer,
}

impl RedpandaClient {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl EventPublisher for RedpandaClient {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(
                record,
                rdkafka::util::Timeout::After(std::time::Duration::from_secs(5)),
            )
            .await
            .map_err(|(e, _)| anyhow::anyhow!("kafka send error: {}", e))?;

        tracing::info!(topic = %topic, key = %key, "published to Redpanda");
        Ok(())
    }
}
