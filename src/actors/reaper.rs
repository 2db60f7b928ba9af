use actix::prelude::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::seat_map::{SeatMapCommand, SeatMapCommandHandler, SeatMapEvent};
use crate::event_sourcing::EventStore;

// ============================================================================
// Hold Reaper
// ============================================================================
//
// Background sweep returning expired holds to the pool. Runs through the
// ordinary command path (`ReclaimExpired`), so every reclaim is an event in
// the store and an `AsientoLiberado` on the bus.
//
// Safe to run from several replicas at once: the command is a state-checked
// no-op when the seat was already resolved, and the store's version check
// serializes racing replicas.
//
// ============================================================================

pub struct ReaperTask<S> {
    handler: Arc<SeatMapCommandHandler<S>>,
}

impl<S> ReaperTask<S>
where
    S: EventStore<SeatMapEvent> + 'static,
{
    pub fn new(handler: Arc<SeatMapCommandHandler<S>>) -> Self {
        Self { handler }
    }

    /// One pass over every map: reclaim each seat whose hold has expired.
    ///
    /// Returns the number of seats swept (no-op reclaims included).
    pub async fn sweep_once(&self) -> anyhow::Result<u32> {
        let as_of = Utc::now();
        let mut swept = 0;

        for map_id in self.handler.store().list_aggregates().await? {
            let aggregate = match self.handler.load(map_id).await {
                Ok(aggregate) => aggregate,
                Err(e) => {
                    tracing::warn!(map_id = %map_id, error = %e, "reaper could not load map");
                    continue;
                }
            };

            for seat in aggregate.expired_holds(as_of) {
                let command = SeatMapCommand::ReclaimExpired {
                    row: seat.row.clone(),
                    number: seat.number,
                    as_of,
                };

                match self.handler.handle(map_id, command, Uuid::new_v4()).await {
                    Ok(_) => {
                        swept += 1;
                        tracing::info!(
                            map_id = %map_id,
                            seat = %seat,
                            "expired hold reclaimed"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            map_id = %map_id,
                            seat = %seat,
                            error = %e,
                            "reclaim failed, seat stays for next sweep"
                        );
                    }
                }
            }
        }

        Ok(swept)
    }
}

// ============================================================================
// Actor surface
// ============================================================================

pub struct ReaperActor<S> {
    task: Arc<ReaperTask<S>>,
    interval: Duration,
}

impl<S> ReaperActor<S>
where
    S: EventStore<SeatMapEvent> + 'static,
{
    pub fn new(handler: Arc<SeatMapCommandHandler<S>>, interval: Duration) -> Self {
        Self {
            task: Arc::new(ReaperTask::new(handler)),
            interval,
        }
    }
}

impl<S> Actor for ReaperActor<S>
where
    S: EventStore<SeatMapEvent> + Unpin + 'static,
{
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(interval_secs = self.interval.as_secs(), "ReaperActor started");

        ctx.run_interval(self.interval, |act, _ctx| {
            let task = act.task.clone();
            actix::spawn(async move {
                match task.sweep_once().await {
                    Ok(0) => {}
                    Ok(swept) => tracing::info!(swept = swept, "reaper pass complete"),
                    Err(e) => tracing::error!(error = %e, "reaper pass failed"),
                }
            });
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
