use std::time::Duration;

// ============================================================================
// Engine Configuration
// ============================================================================
//
// Environment-driven knobs with defaults that work for local development.
// Every variable is prefixed `BOLETERIA_`.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Topic carrying seat map events.
    pub seat_map_topic: String,
    /// Topic carrying cross-context events from the events service.
    pub events_topic: String,

    /// Hold TTL applied when the caller does not pick one.
    pub default_hold_ttl_seconds: u64,
    /// How often the reaper sweeps for expired holds.
    pub reaper_interval: Duration,

    /// How often the dispatcher polls the outbox.
    pub outbox_poll_interval: Duration,
    /// Outbox rows fetched per pass.
    pub outbox_batch_size: usize,

    pub metrics_port: u16,

    /// Kafka/Redpanda bootstrap servers (feature `redpanda`).
    pub kafka_brokers: String,
    /// ScyllaDB contact point (feature `scylla-store`).
    pub scylla_node: String,
    pub keyspace: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seat_map_topic: "mapa-asientos-events".to_string(),
            events_topic: "eventos".to_string(),
            default_hold_ttl_seconds: 300,
            reaper_interval: Duration::from_secs(5),
            outbox_poll_interval: Duration::from_millis(500),
            outbox_batch_size: 100,
            metrics_port: 9090,
            kafka_brokers: "127.0.0.1:9092".to_string(),
            scylla_node: "127.0.0.1:9042".to_string(),
            keyspace: "boleteria_ks".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            seat_map_topic: env_or("BOLETERIA_SEAT_TOPIC", defaults.seat_map_topic),
            events_topic: env_or("BOLETERIA_EVENTS_TOPIC", defaults.events_topic),
            default_hold_ttl_seconds: env_or(
                "BOLETERIA_HOLD_TTL_SECS",
                defaults.default_hold_ttl_seconds,
            ),
            reaper_interval: Duration::from_secs(env_or(
                "BOLETERIA_REAPER_INTERVAL_SECS",
                defaults.reaper_interval.as_secs(),
            )),
            outbox_poll_interval: Duration::from_millis(env_or(
                "BOLETERIA_OUTBOX_POLL_MS",
                defaults.outbox_poll_interval.as_millis() as u64,
            )),
            outbox_batch_size: env_or("BOLETERIA_OUTBOX_BATCH", defaults.outbox_batch_size),
            metrics_port: env_or("BOLETERIA_METRICS_PORT", defaults.metrics_port),
            kafka_brokers: env_or("BOLETERIA_KAFKA_BROKERS", defaults.kafka_brokers),
            scylla_node: env_or("BOLETERIA_SCYLLA_NODE", defaults.scylla_node),
            keyspace: env_or("BOLETERIA_KEYSPACE", defaults.keyspace),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
