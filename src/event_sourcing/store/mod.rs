// ============================================================================
// Event Sourcing Store - Persistence Layer
// ============================================================================
//
// The store contract plus its backends: in-memory (tests, demo) and ScyllaDB
// (feature `scylla-store`).
//
// ============================================================================

pub mod event_store;
pub mod memory;
#[cfg(feature = "scylla-store")]
pub mod scylla;

pub use event_store::{EventStore, OutboxMessage, OutboxStore, StoreError};
pub use memory::MemoryEventStore;
#[cfg(feature = "scylla-store")]
pub use self::scylla::ScyllaEventStore;
