use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::event_store::{EventStore, OutboxMessage, OutboxStore, StoreError};
use crate::event_sourcing::core::{serialize_event, DomainEvent, EventEnvelope};

// ============================================================================
// In-Memory Event Store
// ============================================================================
//
// Backs the demo binary and the test suite. Holds event streams and outbox
// rows under one lock, so an append is atomic exactly the way a storage
// batch is: either the events and their outbox rows are all visible, or none
// are. The optimistic version check runs under the same lock.
//
// ============================================================================

struct OutboxRow {
    message: OutboxMessage,
    published: bool,
}

struct Inner<E> {
    streams: HashMap<Uuid, Vec<EventEnvelope<E>>>,
    outbox: Vec<OutboxRow>,
}

pub struct MemoryEventStore<E> {
    aggregate_type: String,
    topic: String,
    inner: Mutex<Inner<E>>,
}

impl<E: DomainEvent> MemoryEventStore<E> {
    pub fn new(aggregate_type: &str, topic: &str) -> Self {
        Self {
            aggregate_type: aggregate_type.to_string(),
            topic: topic.to_string(),
            inner: Mutex::new(Inner {
                streams: HashMap::new(),
                outbox: Vec::new(),
            }),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> EventStore<E> for MemoryEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        let mut inner = self.inner.lock().await;

        let current = inner
            .streams
            .get(&aggregate_id)
            .and_then(|s| s.last())
            .map(|e| e.sequence_number)
            .unwrap_or(0);

        if current != expected_version {
            return Err(StoreError::VersionConflict {
                aggregate_id,
                expected: expected_version,
                current,
            });
        }

        let new_version = expected_version + events.len() as i64;

        // Serialize outbox payloads before mutating anything, so a failure
        // leaves the store untouched.
        let mut rows = Vec::with_capacity(events.len());
        for envelope in &events {
            let payload = serialize_event(envelope).map_err(|e| {
                StoreError::Backend(format!("outbox payload serialization: {}", e))
            })?;
            rows.push(OutboxRow {
                message: OutboxMessage {
                    id: Uuid::new_v4(),
                    aggregate_id,
                    aggregate_type: self.aggregate_type.clone(),
                    event_id: envelope.event_id,
                    event_type: envelope.event_type.clone(),
                    event_version: envelope.event_version,
                    payload,
                    topic: self.topic.clone(),
                    partition_key: aggregate_id.to_string(),
                    created_at: envelope.timestamp,
                    attempts: 0,
                },
                published: false,
            });
        }

        inner
            .streams
            .entry(aggregate_id)
            .or_default()
            .extend(events);
        inner.outbox.extend(rows);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type,
            new_version = new_version,
            "appended events with outbox rows"
        );

        Ok(new_version)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .streams
            .get(&aggregate_id)
            .and_then(|s| s.last())
            .map(|e| e.sequence_number)
            .unwrap_or(0))
    }

    async fn list_aggregates(&self) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.streams.keys().copied().collect())
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> OutboxStore for MemoryEventStore<E> {
    async fn fetch_unpublished(&self, limit: usize) -> Result<Vec<OutboxMessage>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .outbox
            .iter()
            .filter(|r| !r.published)
            .take(limit)
            .map(|r| r.message.clone())
            .collect())
    }

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for row in inner.outbox.iter_mut() {
            if ids.contains(&row.message.id) {
                row.published = true;
            }
        }
        Ok(())
    }

    async fn record_attempt(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.outbox.iter_mut().find(|r| r.message.id == id) {
            row.message.attempts += 1;
        }
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.outbox.iter().filter(|r| !r.published).count())
    }
}

// ============================================================================
// Tests
// ============================================================================
