use async_trait::async_trait;
use std::sync::Arc;

use super::hub::{PushMessage, RealtimeHub};
use crate::domain::seat_map::SeatMapEvent;
use crate::event_sourcing::EventEnvelope;
use crate::projections::{ApplyOutcome, Projection, ProjectionError};

// ============================================================================
// Realtime Notifier
// ============================================================================
//
// Bus consumer folding seat events into hub pushes. Runs under the same
// projection runner as the read models, so poison handling and retry come
// for free. Pushes are fire-and-forget: redelivering a seat event pushes the
// same seat state again, which clients render idempotently.
//
// ============================================================================

pub struct RealtimeNotifier {
    hub: Arc<RealtimeHub>,
}

impl RealtimeNotifier {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Projection for RealtimeNotifier {
    fn name(&self) -> &'static str {
        "realtime-notifier"
    }

    async fn apply(&self, payload: &str) -> Result<ApplyOutcome, ProjectionError> {
        let envelope: EventEnvelope<SeatMapEvent> = serde_json::from_str(payload)
            .map_err(|e| ProjectionError::Malformed(e.to_string()))?;

        let owning_event = envelope.event_data.owning_event_id();

        let outcome = match &envelope.event_data {
            SeatMapEvent::SeatReserved(e) => {
                let delivered = self.hub.push_to_event(
                    owning_event,
                    PushMessage::SeatReserved {
                        seat_id: format!("{}-{}", e.row, e.number),
                        user_id: e.holder_id,
                    },
                );
                tracing::debug!(
                    event_id = %owning_event,
                    delivered = delivered,
                    "seat reservation pushed to viewers"
                );
                ApplyOutcome::Applied
            }
            SeatMapEvent::SeatReleased(e) => {
                self.hub.push_to_event(
                    owning_event,
                    PushMessage::SeatReleased {
                        seat_id: format!("{}-{}", e.row, e.number),
                    },
                );
                ApplyOutcome::Applied
            }
            SeatMapEvent::SeatSold(e) => {
                // Viewers see a sold seat leave the pool; the buyer gets a
                // personal confirmation.
                self.hub.push_to_event(
                    owning_event,
                    PushMessage::SeatReserved {
                        seat_id: format!("{}-{}", e.row, e.number),
                        user_id: e.holder_id,
                    },
                );
                self.hub.notify_user(
                    e.holder_id,
                    serde_json::json!({
                        "tipo": "compra-confirmada",
                        "asiento": format!("{}-{}", e.row, e.number),
                        "precio": e.price,
                    }),
                );
                ApplyOutcome::Applied
            }
            // Map growth events have no live-viewer surface.
            _ => ApplyOutcome::Skipped,
        };

        Ok(outcome)
    }
}

// ============================================================================
// Tests
// ============================================================================
