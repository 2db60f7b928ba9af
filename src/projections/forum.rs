use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{ApplyOutcome, Projection, ProjectionError};
use crate::utils::TokenCache;

// ============================================================================
// Forum Existence Projection
// ============================================================================
//
// Creates the discussion forum for an event when the events context
// publishes `EventoPublicado`. Idempotency is by natural key: the forum
// record is keyed by evento id and creation is conditional on absence, so a
// duplicate delivery can never create a second forum.
//
// Forum creation is an authenticated call into the forum service; the
// service token comes from the single-flight token cache.
//
// ============================================================================

/// Cross-context event consumed from the events service. Wire names are that
/// service's published contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPublished {
    #[serde(rename = "eventoId")]
    pub evento_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fechaEvento")]
    pub event_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForumRecord {
    pub evento_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub struct ForumProjection {
    records: Mutex<HashMap<Uuid, ForumRecord>>,
    tokens: Arc<TokenCache>,
}

impl ForumProjection {
    pub fn new(tokens: Arc<TokenCache>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            tokens,
        }
    }

    pub fn forum_for(&self, evento_id: Uuid) -> Option<ForumRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.get(&evento_id).cloned()
    }

    pub fn forum_count(&self) -> usize {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.len()
    }
}

#[async_trait]
impl Projection for ForumProjection {
    fn name(&self) -> &'static str {
        "forum-existence"
    }

    async fn apply(&self, payload: &str) -> Result<ApplyOutcome, ProjectionError> {
        let event: EventPublished = serde_json::from_str(payload)
            .map_err(|e| ProjectionError::Malformed(e.to_string()))?;

        // Existence check BEFORE creating anything. Holding no lock across
        // the token call keeps the check-and-insert atomic below.
        {
            let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            if records.contains_key(&event.evento_id) {
                tracing::debug!(
                    evento_id = %event.evento_id,
                    "forum already exists, duplicate EventoPublicado skipped"
                );
                return Ok(ApplyOutcome::Skipped);
            }
        }

        let _token = self
            .tokens
            .token()
            .await
            .map_err(|e| ProjectionError::Apply(format!("service token: {}", e)))?;

        let record = ForumRecord {
            evento_id: event.evento_id,
            name: event.name.clone(),
            created_at: Utc::now(),
        };

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(&event.evento_id) {
            // Lost a race against a concurrent delivery of the same event.
            return Ok(ApplyOutcome::Skipped);
        }
        records.insert(event.evento_id, record);

        tracing::info!(evento_id = %event.evento_id, name = %event.name, "forum created");
        Ok(ApplyOutcome::Applied)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{ServiceToken, TokenFetcher};
    use std::time::Duration;

    struct StubFetcher;

    #[async_trait]
    impl TokenFetcher for StubFetcher {
        async fn fetch(&self) -> anyhow::Result<ServiceToken> {
            Ok(ServiceToken {
                access_token: "stub".to_string(),
                expires_in: Duration::from_secs(3600),
            })
        }
    }

    fn projection() -> ForumProjection {
        ForumProjection::new(Arc::new(TokenCache::new(
            Arc::new(StubFetcher),
            Duration::from_secs(30),
        )))
    }

    fn published(evento_id: Uuid) -> String {
        serde_json::to_string(&EventPublished {
            evento_id,
            name: "Concierto de Rock".to_string(),
            event_date: Utc::now(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_forum_created_on_first_delivery() {
        let projection = projection();
        let evento_id = Uuid::new_v4();

        let outcome = projection.apply(&published(evento_id)).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);

        let record = projection.forum_for(evento_id).unwrap();
        assert_eq!(record.name, "Concierto de Rock");
    }

    #[tokio::test]
    async fn test_duplicate_delivery_creates_exactly_one_forum() {
        let projection = projection();
        let evento_id = Uuid::new_v4();
        let payload = published(evento_id);

        assert_eq!(
            projection.apply(&payload).await.unwrap(),
            ApplyOutcome::Applied
        );
        assert_eq!(
            projection.apply(&payload).await.unwrap(),
            ApplyOutcome::Skipped
        );
        assert_eq!(projection.forum_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_events_get_distinct_forums() {
        let projection = projection();
        projection.apply(&published(Uuid::new_v4())).await.unwrap();
        projection.apply(&published(Uuid::new_v4())).await.unwrap();
        assert_eq!(projection.forum_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_reported() {
        let projection = projection();
        let err = projection.apply("[]").await.unwrap_err();
        assert!(matches!(err, ProjectionError::Malformed(_)));
    }

    struct FailingFetcher;

    #[async_trait]
    impl TokenFetcher for FailingFetcher {
        async fn fetch(&self) -> anyhow::Result<ServiceToken> {
            anyhow::bail!("identity provider down")
        }
    }

    #[tokio::test]
    async fn test_token_failure_is_retryable_apply_error() {
        let projection = ForumProjection::new(Arc::new(TokenCache::new(
            Arc::new(FailingFetcher),
            Duration::from_secs(30),
        )));

        let err = projection
            .apply(&published(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Apply(_)));
        assert_eq!(projection.forum_count(), 0);
    }
}
