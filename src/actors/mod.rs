// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for the background processes:
// - reaper:            reclaims expired holds on a schedule
// - outbox_dispatcher: drains the transactional outbox into the fabric
// - dlq:               parks poison events for manual inspection
// - health:            aggregates component health
// - coordinator:       supervises the above
//
// Domain logic (reserve, release, confirm) goes through command handlers,
// NOT actors. Actors are reserved for infrastructure concerns.
//
// ============================================================================

pub mod coordinator;
pub mod dlq;
pub mod health;
pub mod outbox_dispatcher;
pub mod reaper;

pub use coordinator::{CoordinatorActor, CoordinatorConfig, GetDlqActor, GetHealthMonitor, Shutdown};
pub use dlq::{AddToDlq, DeadLetter, DeadLetterStore, DlqActor, DlqStats, GetDlqMessages, GetDlqStats};
pub use health::{ComponentHealth, GetSystemHealth, HealthMonitorActor, HealthStatus, SystemHealth, UpdateHealth};
pub use outbox_dispatcher::{OutboxDispatcher, OutboxDispatcherActor};
pub use reaper::{ReaperActor, ReaperTask};
