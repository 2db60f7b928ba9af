use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ApplyOutcome, Projection, ProjectionError};
use crate::domain::seat_map::{SeatMapEvent, SeatState};
use crate::event_sourcing::EventEnvelope;

// ============================================================================
// Event Dashboard Projection
// ============================================================================
//
// Live seat counts (available / held / sold) per owning event, for the
// operations dashboard. Deduplication is a state check: the projection keeps
// each seat's last state and the id of the event that produced it, so a
// redelivery is recognized and an out-of-order delivery that contradicts the
// known state is logged and skipped instead of corrupting the counters.
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeatCounts {
    pub available: u64,
    pub held: u64,
    pub sold: u64,
}

struct SeatSnapshot {
    state: SeatState,
    last_event_id: Uuid,
}

#[derive(Default)]
struct EventBoard {
    counts: SeatCounts,
    seats: HashMap<(Uuid, String, u32), SeatSnapshot>,
}

#[derive(Default)]
pub struct DashboardProjection {
    boards: Mutex<HashMap<Uuid, EventBoard>>,
}

impl DashboardProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts_for(&self, owning_event_id: Uuid) -> Option<SeatCounts> {
        let boards = self.boards.lock().unwrap_or_else(|e| e.into_inner());
        boards.get(&owning_event_id).map(|b| b.counts)
    }
}

#[async_trait]
impl Projection for DashboardProjection {
    fn name(&self) -> &'static str {
        "event-dashboard"
    }

    async fn apply(&self, payload: &str) -> Result<ApplyOutcome, ProjectionError> {
        let envelope: EventEnvelope<SeatMapEvent> = serde_json::from_str(payload)
            .map_err(|e| ProjectionError::Malformed(e.to_string()))?;

        let owning_event = envelope.event_data.owning_event_id();
        let mut boards = self.boards.lock().unwrap_or_else(|e| e.into_inner());
        let board = boards.entry(owning_event).or_default();

        let outcome = match &envelope.event_data {
            SeatMapEvent::MapCreated(_) | SeatMapEvent::CategoryAdded(_) => ApplyOutcome::Skipped,

            SeatMapEvent::SeatAdded(e) => {
                let key = (e.map_id, e.row.clone(), e.number);
                if board.seats.contains_key(&key) {
                    ApplyOutcome::Skipped
                } else {
                    board.seats.insert(
                        key,
                        SeatSnapshot {
                            state: SeatState::Available,
                            last_event_id: envelope.event_id,
                        },
                    );
                    board.counts.available += 1;
                    ApplyOutcome::Applied
                }
            }

            SeatMapEvent::SeatReserved(e) => {
                let key = (e.map_id, e.row.clone(), e.number);
                match board.seats.get_mut(&key) {
                    None => {
                        tracing::warn!(
                            seat = %format!("{}-{}", e.row, e.number),
                            "reservation for a seat this projection never saw added, skipping"
                        );
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) if snapshot.last_event_id == envelope.event_id => {
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) => match snapshot.state {
                        SeatState::Available => {
                            snapshot.state = SeatState::Held;
                            snapshot.last_event_id = envelope.event_id;
                            board.counts.available -= 1;
                            board.counts.held += 1;
                            ApplyOutcome::Applied
                        }
                        // An expired hold reclaimed by a new buyer: still
                        // held, counts unchanged.
                        SeatState::Held => {
                            snapshot.last_event_id = envelope.event_id;
                            ApplyOutcome::Applied
                        }
                        SeatState::Sold => {
                            tracing::warn!(
                                seat = %format!("{}-{}", e.row, e.number),
                                "reservation delivered for a sold seat, skipping"
                            );
                            ApplyOutcome::Skipped
                        }
                    },
                }
            }

            SeatMapEvent::SeatReleased(e) => {
                let key = (e.map_id, e.row.clone(), e.number);
                match board.seats.get_mut(&key) {
                    None => {
                        tracing::warn!(
                            seat = %format!("{}-{}", e.row, e.number),
                            "release for a seat this projection never saw reserved, skipping"
                        );
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) if snapshot.last_event_id == envelope.event_id => {
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) => match snapshot.state {
                        SeatState::Available => ApplyOutcome::Skipped,
                        SeatState::Held => {
                            snapshot.state = SeatState::Available;
                            snapshot.last_event_id = envelope.event_id;
                            board.counts.held -= 1;
                            board.counts.available += 1;
                            ApplyOutcome::Applied
                        }
                        SeatState::Sold => {
                            snapshot.state = SeatState::Available;
                            snapshot.last_event_id = envelope.event_id;
                            board.counts.sold -= 1;
                            board.counts.available += 1;
                            ApplyOutcome::Applied
                        }
                    },
                }
            }

            SeatMapEvent::SeatSold(e) => {
                let key = (e.map_id, e.row.clone(), e.number);
                match board.seats.get_mut(&key) {
                    None => {
                        tracing::warn!(
                            seat = %format!("{}-{}", e.row, e.number),
                            "sale for a seat this projection never saw added, skipping"
                        );
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) if snapshot.last_event_id == envelope.event_id => {
                        ApplyOutcome::Skipped
                    }
                    Some(snapshot) => match snapshot.state {
                        SeatState::Sold => ApplyOutcome::Skipped,
                        SeatState::Held => {
                            snapshot.state = SeatState::Sold;
                            snapshot.last_event_id = envelope.event_id;
                            board.counts.held -= 1;
                            board.counts.sold += 1;
                            ApplyOutcome::Applied
                        }
                        // Sale observed before its reservation; the sale is
                        // authoritative.
                        SeatState::Available => {
                            snapshot.state = SeatState::Sold;
                            snapshot.last_event_id = envelope.event_id;
                            board.counts.available -= 1;
                            board.counts.sold += 1;
                            ApplyOutcome::Applied
                        }
                    },
                }
            }
        };

        Ok(outcome)
    }
}

// ============================================================================
// Tests
// ============================================================================
