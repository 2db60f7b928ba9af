use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::SeatMapAggregate;
use super::commands::SeatMapCommand;
use super::errors::SeatMapError;
use super::events::SeatMapEvent;
use crate::event_sourcing::{Aggregate, EventEnvelope, EventStore, StoreError};

// ============================================================================
// Seat Map Command Handler
// ============================================================================
//
// Orchestrates: command -> aggregate -> events -> event store (+ outbox).
//
// Concurrency: the store's optimistic version check serializes writers per
// map. On a version conflict the handler reloads and re-validates instead of
// failing the caller outright:
//   - a concurrent writer to the SAME seat loses validation on reload and
//     surfaces a conflict error (`SeatNotAvailable`, ...);
//   - a concurrent writer to a DIFFERENT seat of the same map passes
//     re-validation and its append succeeds, so independent seats proceed
//     in parallel with no map-wide lock semantics.
//
// ============================================================================

const MAX_CONFLICT_RETRIES: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Domain(#[from] SeatMapError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// True when the caller should retry with a different seat.
    pub fn is_conflict(&self) -> bool {
        match self {
            CommandError::Domain(e) => e.kind() == super::errors::ErrorKind::Conflict,
            CommandError::Store(e) => e.is_version_conflict(),
        }
    }
}

pub struct SeatMapCommandHandler<S> {
    store: Arc<S>,
}

impl<S> SeatMapCommandHandler<S>
where
    S: EventStore<SeatMapEvent>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Handle a command and persist the resulting events.
    ///
    /// Returns the map's new version (unchanged for idempotent no-ops).
    pub async fn handle(
        &self,
        map_id: Uuid,
        command: SeatMapCommand,
        correlation_id: Uuid,
    ) -> Result<i64, CommandError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let exists = self.store.aggregate_exists(map_id).await?;

            let (expected_version, events) = if exists {
                let aggregate: SeatMapAggregate = self.store.load_aggregate(map_id).await?;
                let events = aggregate.handle_command(&command)?;
                (aggregate.version(), events)
            } else {
                match &command {
                    SeatMapCommand::CreateMap {
                        event_id,
                        total_capacity,
                    } => (
                        0,
                        SeatMapAggregate::handle_create(map_id, *event_id, *total_capacity),
                    ),
                    _ => return Err(SeatMapError::NotInitialized.into()),
                }
            };

            // Commands like an already-resolved reclaim legitimately change
            // nothing; report the version the decision was made against.
            if events.is_empty() {
                return Ok(expected_version);
            }

            let envelopes = self.wrap_events(map_id, expected_version, events, correlation_id);

            match self
                .store
                .append_events(map_id, expected_version, envelopes)
                .await
            {
                Ok(new_version) => {
                    tracing::debug!(
                        map_id = %map_id,
                        new_version = new_version,
                        "command committed"
                    );
                    return Ok(new_version);
                }
                Err(e) if e.is_version_conflict() && attempt < MAX_CONFLICT_RETRIES => {
                    tracing::debug!(
                        map_id = %map_id,
                        attempt = attempt,
                        "version conflict, reloading and re-validating"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Load the current state of a map. Used by the reaper and read paths.
    pub async fn load(&self, map_id: Uuid) -> Result<SeatMapAggregate, CommandError> {
        Ok(self.store.load_aggregate(map_id).await?)
    }

    fn wrap_events(
        &self,
        map_id: Uuid,
        expected_version: i64,
        events: Vec<SeatMapEvent>,
        correlation_id: Uuid,
    ) -> Vec<EventEnvelope<SeatMapEvent>> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut seq = expected_version;

        for event in events {
            seq += 1;
            let user_id = match &event {
                SeatMapEvent::SeatReserved(e) => Some(e.holder_id),
                SeatMapEvent::SeatSold(e) => Some(e.holder_id),
                _ => None,
            };

            let mut envelope = EventEnvelope::wrap(map_id, seq, event, correlation_id);
            if let Some(user_id) = user_id {
                envelope = envelope.with_user(user_id);
            }
            envelopes.push(envelope);
        }

        envelopes
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
