// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers the paths that page somebody at 2am:
// - reservation throughput and conflict rate
// - hold reaping
// - outbox drain (published, failed, backlog)
// - projection apply/skip/failure rates
// - dead letter queue growth
// - realtime push volume
//
// Scraped via /metrics on the actix-web server in src/metrics/server.rs.
//
// ============================================================================

/// Central metrics registry for the whole engine.
pub struct Metrics {
    registry: Registry,

    // Reservation metrics
    pub reservations_total: IntCounterVec,
    pub command_duration: HistogramVec,

    // Reaper metrics
    pub holds_reclaimed_total: IntCounter,

    // Outbox metrics
    pub outbox_published_total: IntCounter,
    pub outbox_publish_failures_total: IntCounter,
    pub outbox_pending: IntGauge,

    // Projection metrics
    pub projection_events_total: IntCounterVec,

    // DLQ metrics
    pub dlq_messages_total: IntCounterVec,

    // Realtime metrics
    pub realtime_pushes_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let reservations_total = IntCounterVec::new(
            Opts::new("reservations_total", "Reservation attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(reservations_total.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("command_duration_seconds", "Seat map command duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let holds_reclaimed_total = IntCounter::new(
            "holds_reclaimed_total",
            "Expired holds returned to the pool by the reaper",
        )?;
        registry.register(Box::new(holds_reclaimed_total.clone()))?;

        let outbox_published_total = IntCounter::new(
            "outbox_published_total",
            "Outbox rows successfully published to the fabric",
        )?;
        registry.register(Box::new(outbox_published_total.clone()))?;

        let outbox_publish_failures_total = IntCounter::new(
            "outbox_publish_failures_total",
            "Publish attempts that exhausted their retries",
        )?;
        registry.register(Box::new(outbox_publish_failures_total.clone()))?;

        let outbox_pending = IntGauge::new(
            "outbox_pending",
            "Outbox rows waiting to be published",
        )?;
        registry.register(Box::new(outbox_pending.clone()))?;

        let projection_events_total = IntCounterVec::new(
            Opts::new(
                "projection_events_total",
                "Events processed per projection by outcome",
            ),
            &["projection", "outcome"],
        )?;
        registry.register(Box::new(projection_events_total.clone()))?;

        let dlq_messages_total = IntCounterVec::new(
            Opts::new("dlq_messages_total", "Dead-lettered events by consumer"),
            &["consumer"],
        )?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        let realtime_pushes_total = IntCounterVec::new(
            Opts::new("realtime_pushes_total", "Realtime pushes by message type"),
            &["message_type"],
        )?;
        registry.register(Box::new(realtime_pushes_total.clone()))?;

        Ok(Self {
            registry,
            reservations_total,
            command_duration,
            holds_reclaimed_total,
            outbox_published_total,
            outbox_publish_failures_total,
            outbox_pending,
            projection_events_total,
            dlq_messages_total,
            realtime_pushes_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_reservation(&self, granted: bool) {
        let outcome = if granted { "granted" } else { "conflict" };
        self.reservations_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_command(&self, command: &str, duration_secs: f64) {
        self.command_duration
            .with_label_values(&[command])
            .observe(duration_secs);
    }

    pub fn record_reclaimed(&self, count: u64) {
        self.holds_reclaimed_total.inc_by(count);
    }

    pub fn record_outbox_publish(&self, success: bool) {
        if success {
            self.outbox_published_total.inc();
        } else {
            self.outbox_publish_failures_total.inc();
        }
    }

    pub fn set_outbox_pending(&self, pending: usize) {
        self.outbox_pending.set(pending as i64);
    }

    pub fn record_projection_event(&self, projection: &str, outcome: &str) {
        self.projection_events_total
            .with_label_values(&[projection, outcome])
            .inc();
    }

    pub fn record_dead_letter(&self, consumer: &str) {
        self.dlq_messages_total.with_label_values(&[consumer]).inc();
    }

    pub fn record_push(&self, message_type: &str) {
        self.realtime_pushes_total
            .with_label_values(&[message_type])
            .inc();
    }
}
