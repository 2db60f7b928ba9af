use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{ApplyOutcome, Projection, ProjectionError};
use crate::actors::dlq::{DeadLetter, DeadLetterStore};
use crate::messaging::BusMessage;
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

// ============================================================================
// Projection Runner
// ============================================================================
//
// Feeds one projection from one consumer-group subscription.
//
// Failure policy per delivered message:
// - malformed payload: logged and skipped, never retried
// - apply error: retried with backoff; after the last attempt the message
//   goes to the dead letter queue so the partition keeps moving
//
// A message is never dropped silently: it is applied, skipped with a log
// line, or dead-lettered.
//
// ============================================================================

pub struct ProjectionRunner {
    projection: Arc<dyn Projection>,
    retry: RetryConfig,
    dead_letters: Arc<DeadLetterStore>,
}

impl ProjectionRunner {
    pub fn new(
        projection: Arc<dyn Projection>,
        retry: RetryConfig,
        dead_letters: Arc<DeadLetterStore>,
    ) -> Self {
        Self {
            projection,
            retry,
            dead_letters,
        }
    }

    /// Consume the subscription until the channel closes.
    pub async fn run(&self, mut subscription: mpsc::UnboundedReceiver<BusMessage>) {
        tracing::info!(projection = self.projection.name(), "projection runner started");
        while let Some(message) = subscription.recv().await {
            self.process(message).await;
        }
        tracing::info!(projection = self.projection.name(), "subscription closed");
    }

    /// Apply one delivery, with retry and dead-lettering.
    pub async fn process(&self, message: BusMessage) {
        let projection = self.projection.clone();
        let name = projection.name();
        let first_failed_at = Utc::now();

        let result = retry_with_backoff(self.retry.clone(), |attempt| {
            let projection = projection.clone();
            let payload = message.payload.clone();
            async move {
                match projection.apply(&payload).await {
                    Ok(outcome) => Ok(outcome),
                    Err(ProjectionError::Malformed(reason)) => {
                        // Parsing will not improve on retry.
                        tracing::warn!(
                            projection = projection.name(),
                            reason = %reason,
                            "malformed event skipped"
                        );
                        Ok(ApplyOutcome::Skipped)
                    }
                    Err(ProjectionError::Apply(reason)) => {
                        tracing::warn!(
                            projection = projection.name(),
                            attempt = attempt,
                            reason = %reason,
                            "projection apply failed"
                        );
                        Err(ProjectionError::Apply(reason))
                    }
                }
            }
        })
        .await;

        match result {
            RetryResult::Success(ApplyOutcome::Applied) => {
                tracing::debug!(projection = name, key = %message.key, "event applied");
            }
            RetryResult::Success(ApplyOutcome::Skipped) => {
                tracing::debug!(projection = name, key = %message.key, "event skipped");
            }
            RetryResult::Failed(error) => {
                tracing::error!(
                    projection = name,
                    key = %message.key,
                    error = %error,
                    "poison event routed to dead letter queue"
                );
                self.dead_letters.push(DeadLetter {
                    id: Uuid::new_v4(),
                    consumer: name.to_string(),
                    topic: message.topic.clone(),
                    key: message.key.clone(),
                    payload: message.payload.clone(),
                    error: error.to_string(),
                    failure_count: self.retry.max_attempts,
                    first_failed_at,
                    last_failed_at: Utc::now(),
                });
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyProjection {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl Projection for FlakyProjection {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn apply(&self, _payload: &str) -> Result<ApplyOutcome, ProjectionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ProjectionError::Apply("transient".to_string()))
            } else {
                Ok(ApplyOutcome::Applied)
            }
        }
    }

    struct MalformedProjection;

    #[async_trait]
    impl Projection for MalformedProjection {
        fn name(&self) -> &'static str {
            "malformed"
        }

        async fn apply(&self, _payload: &str) -> Result<ApplyOutcome, ProjectionError> {
            Err(ProjectionError::Malformed("not json".to_string()))
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

    fn message() -> BusMessage {
        BusMessage {
            topic: "seat-events".to_string(),
            key: "map-1".to_string(),
            payload: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_within_retries() {
        let projection = Arc::new(FlakyProjection {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let dead_letters = Arc::new(DeadLetterStore::new());
        let runner = ProjectionRunner::new(projection.clone(), quick_retry(), dead_letters.clone());

        runner.process(message()).await;

        assert_eq!(projection.calls.load(Ordering::SeqCst), 3);
        assert_eq!(dead_letters.len(), 0);
    }

    #[tokio::test]
    async fn test_poison_event_goes_to_dlq() {
        let projection = Arc::new(FlakyProjection {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });
        let dead_letters = Arc::new(DeadLetterStore::new());
        let runner = ProjectionRunner::new(projection, quick_retry(), dead_letters.clone());

        runner.process(message()).await;

        assert_eq!(dead_letters.len(), 1);
        let letter = &dead_letters.letters(10)[0];
        assert_eq!(letter.consumer, "flaky");
        assert_eq!(letter.failure_count, 3);
        assert_eq!(letter.topic, "seat-events");
    }

    #[tokio::test]
    async fn test_malformed_event_is_skipped_not_dead_lettered() {
        let dead_letters = Arc::new(DeadLetterStore::new());
        let runner = ProjectionRunner::new(
            Arc::new(MalformedProjection),
            quick_retry(),
            dead_letters.clone(),
        );

        runner.process(message()).await;

        assert_eq!(dead_letters.len(), 0);
    }

    #[tokio::test]
    async fn test_run_drains_subscription() {
        let projection = Arc::new(FlakyProjection {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let dead_letters = Arc::new(DeadLetterStore::new());
        let runner = ProjectionRunner::new(projection.clone(), quick_retry(), dead_letters);

        let (tx, rx) = mpsc::unbounded_channel();
        for _ in 0..3 {
            tx.send(message()).unwrap();
        }
        drop(tx);

        runner.run(rx).await;
        assert_eq!(projection.calls.load(Ordering::SeqCst), 3);
    }
}
