use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// Event Store Contract
// ============================================================================
//
// Responsibilities of any backing store:
// 1. Append events per aggregate (append-only) under optimistic concurrency
// 2. Write outbox rows in the SAME transaction as the event rows
// 3. Load event history in sequence order
// 4. Serve the outbox dispatcher (fetch unpublished, mark published)
//
// The optimistic version check is the single-writer discipline: a losing
// concurrent writer observes `VersionConflict` and must reload before
// retrying. It never silently overwrites the winner.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict on aggregate {aggregate_id}: expected {expected}, current is {current}")]
    VersionConflict {
        aggregate_id: Uuid,
        expected: i64,
        current: i64,
    },

    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    #[error("cannot append an empty event list")]
    EmptyAppend,

    #[error("corrupt event stream for aggregate {0}: {1}")]
    CorruptStream(Uuid, String),

    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Conflicts are retryable after a reload; everything else is not.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// One row of the transactional outbox.
///
/// The payload is the full serialized [`EventEnvelope`] so consumers receive
/// the event id, sequence number and correlation id they need for
/// deduplication without calling back into this service.
#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: i32,
    pub payload: String,
    pub topic: String,
    pub partition_key: String,
    pub created_at: DateTime<Utc>,
    pub attempts: i32,
}

/// Append/load surface used by command handlers.
#[async_trait]
pub trait EventStore<E: DomainEvent + 'static>: Send + Sync {
    /// Append events atomically with their outbox rows.
    ///
    /// `expected_version` must equal the aggregate's current version or the
    /// append fails with [`StoreError::VersionConflict`]. Returns the new
    /// version.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError>;

    /// Load the full event history of one aggregate in sequence order.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError>;

    /// Current version of an aggregate; 0 if it has never been written.
    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError>;

    /// Ids of every aggregate the store knows. Used by the hold reaper.
    async fn list_aggregates(&self) -> Result<Vec<Uuid>, StoreError>;

    async fn aggregate_exists(&self, aggregate_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.current_version(aggregate_id).await? > 0)
    }

    /// Load and fold an aggregate from its history.
    async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A, StoreError>
    where
        A: Aggregate<Event = E>,
        A::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;
        if events.is_empty() {
            return Err(StoreError::AggregateNotFound(aggregate_id));
        }
        A::load_from_events(&events)
            .map_err(|e| StoreError::CorruptStream(aggregate_id, e.to_string()))
    }
}

/// Drain surface used by the outbox dispatcher.
///
/// Implementations must make `mark_published` idempotent: the dispatcher may
/// crash between publishing and marking, and the resulting redelivery is the
/// at-least-once contract consumers already tolerate.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Oldest unpublished rows, up to `limit`, in creation order.
    async fn fetch_unpublished(&self, limit: usize) -> Result<Vec<OutboxMessage>, StoreError>;

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), StoreError>;

    /// Bump the attempt counter after a failed publish.
    async fn record_attempt(&self, id: Uuid) -> Result<(), StoreError>;

    async fn pending_count(&self) -> Result<usize, StoreError>;
}
