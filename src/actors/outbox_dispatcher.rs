use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::event_sourcing::OutboxStore;
use crate::messaging::EventPublisher;
use crate::utils::{
    retry_with_backoff, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig,
    RetryResult,
};

// ============================================================================
// Outbox Dispatcher
// ============================================================================
//
// Drains the transactional outbox into the message fabric. Completes the
// at-least-once chain: a committed state change always has an outbox row,
// and a row is only marked published after the fabric accepted it. A crash
// between publish and mark re-publishes the row; consumers dedup.
//
// A pass stops at the first row that keeps failing, preserving per-topic
// publish order; the row stays pending and the next pass retries it, so
// delivery retries indefinitely without ever re-running the business
// transaction. The circuit breaker keeps a dead fabric from being hammered.
//
// ============================================================================

pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    retry: RetryConfig,
    batch_size: usize,
    breaker: CircuitBreaker,
}

impl OutboxDispatcher {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        retry: RetryConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            outbox,
            publisher,
            retry,
            batch_size,
            breaker: CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: 5,
                timeout: Duration::from_secs(30),
                success_threshold: 3,
            }),
        }
    }

    /// One drain pass. Returns how many rows were published and marked.
    pub async fn drain_once(&self) -> anyhow::Result<usize> {
        let pending = self.outbox.fetch_unpublished(self.batch_size).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        tracing::debug!(pending = pending.len(), "draining outbox");

        let mut published_ids = Vec::new();

        for message in pending {
            let publisher = self.publisher.clone();
            let breaker = self.breaker.clone();
            let topic = message.topic.clone();
            let key = message.partition_key.clone();
            let payload = message.payload.clone();

            let result = retry_with_backoff(self.retry.clone(), |_attempt| {
                let publisher = publisher.clone();
                let breaker = breaker.clone();
                let topic = topic.clone();
                let key = key.clone();
                let payload = payload.clone();
                async move {
                    breaker
                        .call(publisher.publish(&topic, &key, &payload))
                        .await
                        .map_err(|e| match e {
                            CircuitBreakerError::CircuitOpen => {
                                anyhow::anyhow!("fabric circuit open")
                            }
                            CircuitBreakerError::OperationFailed(err) => err,
                        })
                }
            })
            .await;

            match result {
                RetryResult::Success(()) => {
                    tracing::info!(
                        outbox_id = %message.id,
                        event_type = %message.event_type,
                        topic = %message.topic,
                        "outbox row published"
                    );
                    published_ids.push(message.id);
                }
                RetryResult::Failed(e) => {
                    tracing::error!(
                        outbox_id = %message.id,
                        event_type = %message.event_type,
                        error = %e,
                        "publish failed, row stays pending for next pass"
                    );
                    self.outbox.record_attempt(message.id).await?;
                    // Later rows wait so per-key order is preserved.
                    break;
                }
            }
        }

        if !published_ids.is_empty() {
            self.outbox.mark_published(&published_ids).await?;
        }

        Ok(published_ids.len())
    }
}

// ============================================================================
// Actor surface
// ============================================================================

pub struct OutboxDispatcherActor {
    dispatcher: Arc<OutboxDispatcher>,
    poll_interval: Duration,
}

impl OutboxDispatcherActor {
    pub fn new(dispatcher: Arc<OutboxDispatcher>, poll_interval: Duration) -> Self {
        Self {
            dispatcher,
            poll_interval,
        }
    }
}

impl Actor for OutboxDispatcherActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "OutboxDispatcherActor started"
        );

        ctx.run_interval(self.poll_interval, |act, _ctx| {
            let dispatcher = act.dispatcher.clone();
            actix::spawn(async move {
                match dispatcher.drain_once().await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!(published = count, "outbox pass complete"),
                    Err(e) => tracing::error!(error = %e, "outbox pass failed"),
                }
            });
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::{
        DomainEvent, EventEnvelope, EventStore, MemoryEventStore, OutboxStore,
    };
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct Ping {
        n: u32,
    }

    impl DomainEvent for Ping {
        fn event_type(&self) -> &'static str {
            "Ping"
        }
    }

    async fn store_with_rows(count: u32) -> Arc<MemoryEventStore<Ping>> {
        let store = Arc::new(MemoryEventStore::new("Ping", "ping-events"));
        let id = Uuid::new_v4();
        let envelopes = (1..=count)
            .map(|n| EventEnvelope::wrap(id, n as i64, Ping { n }, Uuid::new_v4()))
            .collect();
        store.append_events(id, 0, envelopes).await.unwrap();
        store
    }

    /// Publisher that fails the first `fail_first` calls, recording the rest.
    struct FlakyPublisher {
        calls: AtomicU32,
        fail_first: u32,
        published: Mutex<Vec<String>>,
    }

    impl FlakyPublisher {
        fn new(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventPublisher for FlakyPublisher {
        async fn publish(&self, _topic: &str, _key: &str, payload: &str) -> anyhow::Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.fail_first {
                anyhow::bail!("fabric unavailable");
            }
            self.published.lock().unwrap().push(payload.to_string());
            Ok(())
        }
    }

    fn quick_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_drain_publishes_and_marks() {
        let store = store_with_rows(2).await;
        let publisher = Arc::new(FlakyPublisher::new(0));
        let dispatcher =
            OutboxDispatcher::new(store.clone(), publisher.clone(), quick_retry(), 10);

        let published = dispatcher.drain_once().await.unwrap();
        assert_eq!(published, 2);
        assert_eq!(store.pending_count().await.unwrap(), 0);
        assert_eq!(publisher.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_within_pass() {
        let store = store_with_rows(1).await;
        let publisher = Arc::new(FlakyPublisher::new(2));
        let dispatcher =
            OutboxDispatcher::new(store.clone(), publisher.clone(), quick_retry(), 10);

        let published = dispatcher.drain_once().await.unwrap();
        assert_eq!(published, 1);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persistent_failure_leaves_row_pending() {
        let store = store_with_rows(1).await;
        let publisher = Arc::new(FlakyPublisher::new(u32::MAX));
        let dispatcher =
            OutboxDispatcher::new(store.clone(), publisher.clone(), quick_retry(), 10);

        let published = dispatcher.drain_once().await.unwrap();
        assert_eq!(published, 0);
        assert_eq!(store.pending_count().await.unwrap(), 1);

        let row = &store.fetch_unpublished(1).await.unwrap()[0];
        assert_eq!(row.attempts, 1);
    }

    #[tokio::test]
    async fn test_failed_row_blocks_later_rows_in_pass() {
        let store = store_with_rows(3).await;
        // Exactly the first row's attempts fail.
        let publisher = Arc::new(FlakyPublisher::new(3));
        let dispatcher =
            OutboxDispatcher::new(store.clone(), publisher.clone(), quick_retry(), 10);

        let published = dispatcher.drain_once().await.unwrap();
        assert_eq!(published, 0);
        assert_eq!(store.pending_count().await.unwrap(), 3);

        // Next pass delivers everything, in order.
        let published = dispatcher.drain_once().await.unwrap();
        assert_eq!(published, 3);
        let payloads = publisher.published.lock().unwrap();
        assert!(payloads[0].contains("\"n\":1"));
        assert!(payloads[2].contains("\"n\":3"));
    }

    #[tokio::test]
    async fn test_empty_outbox_is_a_quiet_pass() {
        let store: Arc<MemoryEventStore<Ping>> =
            Arc::new(MemoryEventStore::new("Ping", "ping-events"));
        let publisher = Arc::new(FlakyPublisher::new(0));
        let dispatcher = OutboxDispatcher::new(store, publisher.clone(), quick_retry(), 10);

        assert_eq!(dispatcher.drain_once().await.unwrap(), 0);
        assert!(publisher.published.lock().unwrap().is_empty());
    }
}
