use super::event::EventEnvelope;
use anyhow::Result;
use uuid::Uuid;

// ============================================================================
// Aggregate Root - Event Sourcing Core
// ============================================================================
//
// State is derived from events; commands are validated against current state
// and emit new events; invariants are enforced inside the aggregate boundary.
//
// This is the GENERIC trait implemented by every event-sourced aggregate in
// the crate (currently the seat map).
//
// ============================================================================

/// Generic aggregate trait.
///
/// Type parameters:
/// - `Event`: the domain event type for this aggregate
/// - `Command`: the command type for this aggregate
/// - `Error`: the error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create a new aggregate from its first event.
    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply a subsequent event to update state.
    ///
    /// Applying a stored event must never fail business validation; stored
    /// events are facts.
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Validate a command against current state and emit resulting events.
    ///
    /// An empty event list is a valid outcome: the command was acceptable but
    /// changed nothing (idempotent no-op paths rely on this).
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Aggregate identity.
    fn aggregate_id(&self) -> Uuid;

    /// Current version (sequence number of the last applied event).
    fn version(&self) -> i64;

    /// Record the sequence number of the event that was just applied.
    fn set_version(&mut self, version: i64);

    /// Reconstruct the aggregate from its event history.
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> Result<Self>
    where
        Self::Error: std::fmt::Display,
    {
        let first = events
            .first()
            .ok_or_else(|| anyhow::anyhow!("no events to load"))?;

        let mut aggregate = Self::apply_first_event(first.aggregate_id, &first.event_data)
            .map_err(|e| anyhow::anyhow!("failed to apply first event: {}", e))?;
        aggregate.set_version(first.sequence_number);

        for envelope in events.iter().skip(1) {
            aggregate
                .apply_event(&envelope.event_data)
                .map_err(|e| anyhow::anyhow!("failed to apply event: {}", e))?;
            aggregate.set_version(envelope.sequence_number);
        }

        Ok(aggregate)
    }
}
