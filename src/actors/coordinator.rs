use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use super::dlq::{DeadLetterStore, DlqActor};
use super::health::{GetSystemHealth, HealthMonitorActor, HealthStatus, UpdateHealth};
use super::outbox_dispatcher::{OutboxDispatcher, OutboxDispatcherActor};
use super::reaper::ReaperActor;
use crate::domain::seat_map::{SeatMapCommandHandler, SeatMapEvent};
use crate::event_sourcing::{EventStore, OutboxStore};
use crate::messaging::EventPublisher;
use crate::utils::RetryConfig;

// ============================================================================
// Coordinator Actor - supervises the infrastructure actors
// ============================================================================
//
// Actor hierarchy:
//   CoordinatorActor
//   ├── DlqActor
//   ├── HealthMonitorActor
//   ├── ReaperActor
//   └── OutboxDispatcherActor
//
// Domain logic stays in command handlers; actors are infrastructure only.
//
// ============================================================================

pub struct CoordinatorConfig {
    pub reaper_interval: Duration,
    pub outbox_poll_interval: Duration,
    pub outbox_batch_size: usize,
    pub publish_retry: RetryConfig,
}

pub struct CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    handler: Arc<SeatMapCommandHandler<S>>,
    outbox: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    dead_letters: Arc<DeadLetterStore>,
    config: CoordinatorConfig,

    dlq_actor: Option<Addr<DlqActor>>,
    health: Option<Addr<HealthMonitorActor>>,
    reaper: Option<Addr<ReaperActor<S>>>,
    dispatcher: Option<Addr<OutboxDispatcherActor>>,
}

impl<S> CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    pub fn new(
        handler: Arc<SeatMapCommandHandler<S>>,
        outbox: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
        dead_letters: Arc<DeadLetterStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            handler,
            outbox,
            publisher,
            dead_letters,
            config,
            dlq_actor: None,
            health: None,
            reaper: None,
            dispatcher: None,
        }
    }

    fn start_children(&mut self) {
        tracing::info!("starting supervised child actors");

        let health = HealthMonitorActor::new(
            self.outbox.clone() as Arc<dyn OutboxStore>,
            self.dead_letters.clone(),
        )
        .start();
        self.health = Some(health.clone());

        let dlq_actor = DlqActor::new(self.dead_letters.clone()).start();
        self.dlq_actor = Some(dlq_actor);
        health.do_send(UpdateHealth {
            component: "dlq_actor".to_string(),
            status: HealthStatus::Healthy,
            details: Some("dead letter queue ready".to_string()),
        });

        let reaper =
            ReaperActor::new(self.handler.clone(), self.config.reaper_interval).start();
        self.reaper = Some(reaper);
        health.do_send(UpdateHealth {
            component: "reaper".to_string(),
            status: HealthStatus::Healthy,
            details: Some("hold reaper sweeping".to_string()),
        });

        let dispatcher = OutboxDispatcherActor::new(
            Arc::new(OutboxDispatcher::new(
                self.outbox.clone() as Arc<dyn OutboxStore>,
                self.publisher.clone(),
                self.config.publish_retry.clone(),
                self.config.outbox_batch_size,
            )),
            self.config.outbox_poll_interval,
        )
        .start();
        self.dispatcher = Some(dispatcher);
        health.do_send(UpdateHealth {
            component: "outbox_dispatcher".to_string(),
            status: HealthStatus::Healthy,
            details: Some("outbox dispatcher polling".to_string()),
        });

        tracing::info!("all supervised actors started");
    }
}

impl<S> Actor for CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("CoordinatorActor started");
        self.start_children();

        ctx.run_interval(Duration::from_secs(30), |act, _ctx| {
            if let Some(ref health) = act.health {
                let health = health.clone();
                actix::spawn(async move {
                    match health.send(GetSystemHealth).await {
                        Ok(snapshot) => match snapshot.overall_status {
                            HealthStatus::Healthy => tracing::debug!("system health: healthy"),
                            HealthStatus::Degraded(msg) => {
                                tracing::warn!("system health degraded: {}", msg)
                            }
                            HealthStatus::Unhealthy(msg) => {
                                tracing::error!("system health unhealthy: {}", msg)
                            }
                        },
                        Err(e) => tracing::error!(error = %e, "health check failed"),
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("CoordinatorActor stopping, shutting down children");
        Running::Stop
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;

/// Internal stop signal forwarded to children during shutdown.
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl<S> Handler<Shutdown> for CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        tracing::info!("received shutdown signal");

        if let Some(ref reaper) = self.reaper {
            reaper.do_send(StopActor);
        }
        if let Some(ref dispatcher) = self.dispatcher {
            dispatcher.do_send(StopActor);
        }
        if let Some(ref dlq_actor) = self.dlq_actor {
            dlq_actor.do_send(StopActor);
        }
        if let Some(ref health) = self.health {
            health.do_send(StopActor);
        }

        ctx.stop();
    }
}

impl Handler<StopActor> for DlqActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("DlqActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}

impl<S> Handler<StopActor> for ReaperActor<S>
where
    S: EventStore<SeatMapEvent> + Unpin + 'static,
{
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("ReaperActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for OutboxDispatcherActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("OutboxDispatcherActor received stop signal");
        ctx.stop();
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<HealthMonitorActor>>")]
pub struct GetHealthMonitor;

impl<S> Handler<GetHealthMonitor> for CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    type Result = Option<Addr<HealthMonitorActor>>;

    fn handle(&mut self, _: GetHealthMonitor, _: &mut Self::Context) -> Self::Result {
        self.health.clone()
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<DlqActor>>")]
pub struct GetDlqActor;

impl<S> Handler<GetDlqActor> for CoordinatorActor<S>
where
    S: EventStore<SeatMapEvent> + OutboxStore + Unpin + 'static,
{
    type Result = Option<Addr<DlqActor>>;

    fn handle(&mut self, _: GetDlqActor, _: &mut Self::Context) -> Self::Result {
        self.dlq_actor.clone()
    }
}
