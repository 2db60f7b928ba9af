// ============================================================================
// Projections - idempotent downstream read models
// ============================================================================
//
// Each projection folds the event stream into a read model it exclusively
// owns, and must stay correct under at-least-once delivery:
// - sales:     seen-event-id dedup next to the aggregate document
// - forum:     conditional create by natural key (evento id)
// - dashboard: per-seat state check with last-event-id dedup
//
// The runner feeds a projection from a consumer-group subscription, retries
// transient failures and dead-letters poison events.
//
// ============================================================================

pub mod consumer;
pub mod dashboard;
pub mod forum;
pub mod sales;

use async_trait::async_trait;

pub use consumer::ProjectionRunner;
pub use dashboard::{DashboardProjection, SeatCounts};
pub use forum::{EventPublished, ForumProjection, ForumRecord};
pub use sales::{DailySalesProjection, DailySalesTotals};

/// Outcome of applying one delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The read model changed.
    Applied,
    /// Duplicate, irrelevant or out-of-order delivery; no change.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// The payload cannot be parsed. Never retried; logged and skipped.
    #[error("malformed event payload: {0}")]
    Malformed(String),

    /// Applying failed transiently. Redelivered/retried by the runner.
    #[error("projection apply failed: {0}")]
    Apply(String),
}

/// A downstream consumer folding events into its own store.
///
/// `apply` MUST be idempotent: applying the same delivery twice leaves the
/// read model exactly as applying it once.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, payload: &str) -> Result<ApplyOutcome, ProjectionError>;
}
