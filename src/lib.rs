//! Seat inventory and event propagation engine for a live-event ticket
//! sales platform.
//!
//! The crate is organized the same way the runtime is:
//! - [`domain`]: the seat map aggregate, its commands, events and errors
//! - [`event_sourcing`]: generic aggregate/envelope/store infrastructure
//!   with a transactional outbox
//! - [`actors`]: background processes (hold reaper, outbox dispatcher,
//!   dead letter queue, health, coordinator)
//! - [`messaging`]: the message fabric boundary (in-process broker, and a
//!   Redpanda producer behind the `redpanda` feature)
//! - [`projections`]: idempotent downstream read models and their runner
//! - [`realtime`]: per-event and per-user live fan-out
//!
//! Two invariants run through everything: a seat can only be held by one
//! buyer at a time, and every committed state change reaches the fabric at
//! least once, with consumers built to absorb the "more than once" part.

pub mod actors;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod messaging;
pub mod metrics;
pub mod projections;
pub mod realtime;
pub mod utils;

pub use config::EngineConfig;
