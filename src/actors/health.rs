use actix::prelude::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::actors::dlq::DeadLetterStore;
use crate::event_sourcing::OutboxStore;

// ============================================================================
// Health Monitor Actor
// ============================================================================
//
// Tracks component health (reaper, dispatcher, consumers) and derives a
// system-wide status. Also watches two leading indicators on its own: the
// outbox backlog and the dead letter queue.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    pub details: Option<String>,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Actor
// ============================================================================

/// Outbox rows pending beyond this means the dispatcher is falling behind.
const OUTBOX_BACKLOG_DEGRADED: usize = 1_000;

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    outbox: Arc<dyn OutboxStore>,
    dead_letters: Arc<DeadLetterStore>,
}

impl HealthMonitorActor {
    pub fn new(outbox: Arc<dyn OutboxStore>, dead_letters: Arc<DeadLetterStore>) -> Self {
        Self {
            components: HashMap::new(),
            outbox,
            dead_letters,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => unhealthy.push(format!("{}: {}", name, msg)),
                HealthStatus::Degraded(_) => has_degraded = true,
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy.is_empty() {
            HealthStatus::Unhealthy(unhealthy.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor started");

        let addr = ctx.address();

        ctx.run_interval(std::time::Duration::from_secs(10), move |act, _ctx| {
            let outbox = act.outbox.clone();
            let dead_letters = act.dead_letters.clone();
            let addr = addr.clone();

            actix::spawn(async move {
                let outbox_status = match outbox.pending_count().await {
                    Ok(pending) if pending > OUTBOX_BACKLOG_DEGRADED => HealthStatus::Degraded(
                        format!("{} outbox rows pending", pending),
                    ),
                    Ok(_) => HealthStatus::Healthy,
                    Err(e) => HealthStatus::Unhealthy(format!("outbox unreadable: {}", e)),
                };
                addr.do_send(UpdateHealth {
                    component: "outbox".to_string(),
                    status: outbox_status,
                    details: None,
                });

                let dlq_len = dead_letters.len();
                let dlq_status = if dlq_len == 0 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded(format!("{} dead letters awaiting inspection", dlq_len))
                };
                addr.do_send(UpdateHealth {
                    component: "dead_letter_queue".to_string(),
                    status: dlq_status,
                    details: None,
                });
            });
        });
    }
}

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _: &mut Self::Context) {
        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "component health updated"
        );

        self.components.insert(
            msg.component.clone(),
            ComponentHealth {
                name: msg.component,
                status: msg.status,
                last_check: Utc::now(),
                details: msg.details,
            },
        );
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = MessageResult<GetSystemHealth>;

    fn handle(&mut self, _msg: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        MessageResult(SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        })
    }
}
