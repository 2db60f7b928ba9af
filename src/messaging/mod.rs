// ============================================================================
// Messaging - the Message Fabric boundary
// ============================================================================
//
// The fabric itself is an external collaborator; this module holds the
// producer contract, the in-process broker used by tests and the demo, and
// the Redpanda producer for real deployments.
//
// ============================================================================

pub mod broker;
pub mod bus;
#[cfg(feature = "redpanda")]
pub mod redpanda;

pub use broker::InProcessBroker;
pub use bus::{BusMessage, EventPublisher};
#[cfg(feature = "redpanda")]
pub use redpanda::RedpandaClient;
