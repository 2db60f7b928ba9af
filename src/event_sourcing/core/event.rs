use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Event Envelope - metadata wrapper around domain events
// ============================================================================
//
// Wraps any domain event with the metadata the store, the outbox and the
// downstream consumers need: identity, per-aggregate sequence, causation and
// correlation ids, timing.
//
// ============================================================================

/// Generic event envelope.
///
/// Type parameter `E` is the domain event type (must implement [`DomainEvent`]).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Event type information
    pub event_type: String,
    pub event_version: i32,

    // Event payload
    pub event_data: E,

    // Causation & correlation (distributed tracing across services)
    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,

    // Who triggered this event (buyer, reaper replica, admin tooling)
    pub user_id: Option<Uuid>,

    // Timing
    pub timestamp: DateTime<Utc>,

    // Additional metadata
    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Wrap a domain event, deriving the wire type name from the event itself.
    pub fn wrap(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_version: event_data.event_version(),
            event_data,
            causation_id: None,
            correlation_id,
            user_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_causation(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Implemented by every event type that flows through the store and the bus.
///
/// `event_type` is the stable wire name published to consumers. It must never
/// change for an already-published event shape; evolve via `event_version`.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
    fn event_version(&self) -> i32 {
        1
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent"
        }
    }

    #[test]
    fn test_envelope_wrap_derives_type_name() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::wrap(
            aggregate_id,
            1,
            TestEvent {
                data: "test".to_string(),
            },
            correlation_id,
        );

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
    }

    #[test]
    fn test_envelope_builders() {
        let user_id = Uuid::new_v4();
        let causation_id = Uuid::new_v4();

        let envelope = EventEnvelope::wrap(
            Uuid::new_v4(),
            3,
            TestEvent {
                data: "x".to_string(),
            },
            Uuid::new_v4(),
        )
        .with_user(user_id)
        .with_causation(causation_id)
        .with_metadata("source".to_string(), "api".to_string());

        assert_eq!(envelope.user_id, Some(user_id));
        assert_eq!(envelope.causation_id, Some(causation_id));
        assert_eq!(envelope.metadata.get("source"), Some(&"api".to_string()));
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = TestEvent {
            data: "payload".to_string(),
        };

        let json = serialize_event(&event).unwrap();
        let back: TestEvent = deserialize_event(&json).unwrap();

        assert_eq!(event.data, back.data);
    }
}
