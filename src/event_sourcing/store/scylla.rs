use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use super::event_store::{EventStore, OutboxMessage, OutboxStore, StoreError};
use crate::event_sourcing::core::{DomainEvent, EventEnvelope};

// ============================================================================
// ScyllaDB Event Store
// ============================================================================
//
// Durable backend for production deployments (feature `scylla-store`).
//
// Tables:
// - seat_map_events     (aggregate_id, sequence_number, event columns)
// - aggregate_sequence  (aggregate_id, current_sequence)
// - outbox_messages     (id, published flag, payload, topic, ...)
//
// Events and their outbox rows go into ONE batch, so a committed state change
// always has its outbox row. The optimistic version check runs against
// aggregate_sequence before the batch; losers see `VersionConflict`.
//
// ============================================================================

pub struct ScyllaEventStore<E> {
    session: Arc<Session>,
    aggregate_type: String,
    topic: String,
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> ScyllaEventStore<E> {
    pub fn new(session: Arc<Session>, aggregate_type: &str, topic: &str) -> Self {
        Self {
            session,
            aggregate_type: aggregate_type.to_string(),
            topic: topic.to_string(),
            _phantom: PhantomData,
        }
    }

    fn backend(e: impl std::fmt::Display) -> StoreError {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> EventStore<E> for ScyllaEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        let current = self.current_version(aggregate_id).await?;
        if current != expected_version {
            return Err(StoreError::VersionConflict {
                aggregate_id,
                expected: expected_version,
                current,
            });
        }

        let mut batch = scylla::statement::batch::Batch::default();
        let mut values: Vec<Box<dyn scylla::serialize::row::SerializeRow>> = vec![];

        let mut new_version = expected_version;

        for envelope in &events {
            new_version += 1;

            let event_json = serde_json::to_string(&envelope.event_data)?;
            let envelope_json = serde_json::to_string(envelope)?;

            batch.append_statement(
                "INSERT INTO seat_map_events (
                    aggregate_id, sequence_number, event_id, event_type, event_version,
                    event_data, causation_id, correlation_id, timestamp
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            );
            values.push(Box::new((
                aggregate_id,
                new_version,
                envelope.event_id,
                envelope.event_type.clone(),
                envelope.event_version,
                event_json,
                envelope.causation_id,
                envelope.correlation_id,
                envelope.timestamp,
            )));

            batch.append_statement(
                "INSERT INTO outbox_messages (
                    id, aggregate_id, aggregate_type, event_id, event_type, event_version,
                    payload, topic, partition_key, created_at, attempts, published
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, false)",
            );
            values.push(Box::new((
                Uuid::new_v4(),
                aggregate_id,
                self.aggregate_type.clone(),
                envelope.event_id,
                envelope.event_type.clone(),
                envelope.event_version,
                envelope_json,
                self.topic.clone(),
                aggregate_id.to_string(),
                Utc::now(),
            )));
        }

        batch.append_statement(
            "INSERT INTO aggregate_sequence (aggregate_id, current_sequence, updated_at) VALUES (?, ?, ?)",
        );
        values.push(Box::new((aggregate_id, new_version, Utc::now())));

        self.session
            .batch(&batch, values)
            .await
            .map_err(Self::backend)?;

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type,
            new_version = new_version,
            event_count = events.len(),
            "appended events to seat_map_events with outbox rows"
        );

        Ok(new_version)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT aggregate_id, sequence_number, event_id, event_type, event_version,
                        event_data, causation_id, correlation_id, timestamp
                 FROM seat_map_events
                 WHERE aggregate_id = ?
                 ORDER BY sequence_number ASC",
                (aggregate_id,),
            )
            .await
            .map_err(Self::backend)?;

        let mut events = Vec::new();

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(events),
        };

        for row in rows_result
            .rows::<(
                Uuid,
                i64,
                Uuid,
                String,
                i32,
                String,
                Option<Uuid>,
                Uuid,
                DateTime<Utc>,
            )>()
            .map_err(Self::backend)?
        {
            let (
                agg_id,
                sequence_number,
                event_id,
                event_type,
                event_version,
                event_data_json,
                causation_id,
                correlation_id,
                timestamp,
            ) = row.map_err(Self::backend)?;

            let event_data: E = serde_json::from_str(&event_data_json)?;

            events.push(EventEnvelope {
                event_id,
                aggregate_id: agg_id,
                sequence_number,
                event_type,
                event_version,
                event_data,
                causation_id,
                correlation_id,
                user_id: None,
                timestamp,
                metadata: std::collections::HashMap::new(),
            });
        }

        Ok(events)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT current_sequence FROM aggregate_sequence WHERE aggregate_id = ?",
                (aggregate_id,),
            )
            .await
            .map_err(Self::backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(0),
        };

        match rows_result.maybe_first_row::<(i64,)>() {
            Ok(Some((version,))) => Ok(version),
            _ => Ok(0),
        }
    }

    async fn list_aggregates(&self) -> Result<Vec<Uuid>, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT aggregate_id FROM aggregate_sequence", &[])
            .await
            .map_err(Self::backend)?;

        let mut ids = Vec::new();
        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(ids),
        };

        for row in rows_result.rows::<(Uuid,)>().map_err(Self::backend)? {
            let (id,) = row.map_err(Self::backend)?;
            ids.push(id);
        }

        Ok(ids)
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> OutboxStore for ScyllaEventStore<E> {
    async fn fetch_unpublished(&self, limit: usize) -> Result<Vec<OutboxMessage>, StoreError> {
        // Filtering on the published flag requires ALLOW FILTERING here; a
        // production keyspace would pair this with a materialized view or
        // time-bucketed partitions.
        let result = self
            .session
            .query_unpaged(
                "SELECT id, aggregate_id, aggregate_type, event_id, event_type, event_version,
                        payload, topic, partition_key, created_at, attempts
                 FROM outbox_messages WHERE published = false LIMIT ? ALLOW FILTERING",
                (limit as i32,),
            )
            .await
            .map_err(Self::backend)?;

        let mut messages = Vec::new();
        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(messages),
        };

        for row in rows_result
            .rows::<(
                Uuid,
                Uuid,
                String,
                Uuid,
                String,
                i32,
                String,
                String,
                String,
                DateTime<Utc>,
                i32,
            )>()
            .map_err(Self::backend)?
        {
            let (
                id,
                aggregate_id,
                aggregate_type,
                event_id,
                event_type,
                event_version,
                payload,
                topic,
                partition_key,
                created_at,
                attempts,
            ) = row.map_err(Self::backend)?;

            messages.push(OutboxMessage {
                id,
                aggregate_id,
                aggregate_type,
                event_id,
                event_type,
                event_version,
                payload,
                topic,
                partition_key,
                created_at,
                attempts,
            });
        }

        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        for id in ids {
            self.session
                .query_unpaged(
                    "UPDATE outbox_messages SET published = true WHERE id = ?",
                    (*id,),
                )
                .await
                .map_err(Self::backend)?;
        }
        Ok(())
    }

    async fn record_attempt(&self, id: Uuid) -> Result<(), StoreError> {
        self.session
            .query_unpaged(
                "UPDATE outbox_messages SET attempts = attempts + 1 WHERE id = ?",
                (id,),
            )
            .await
            .map_err(Self::backend)?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT COUNT(*) FROM outbox_messages WHERE published = false ALLOW FILTERING",
                &[],
            )
            .await
            .map_err(Self::backend)?;

        let rows_result = result.into_rows_result().map_err(Self::backend)?;
        match rows_result.maybe_first_row::<(i64,)>() {
            Ok(Some((count,))) => Ok(count as usize),
            _ => Ok(0),
        }
    }
}
