use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// Seat Map Commands - caller intent entering the aggregate
// ============================================================================

#[derive(Debug, Clone)]
pub enum SeatMapCommand {
    /// Create the map for one event. Per-event uniqueness is enforced by the
    /// events service owning the event; here a map id is created exactly once.
    CreateMap {
        event_id: Uuid,
        total_capacity: u32,
    },
    AddCategory {
        name: String,
        base_price: f64,
        is_premium: bool,
    },
    AddSeat {
        row: String,
        number: u32,
        category: String,
    },
    /// Take a time-limited hold on a seat for a buyer.
    Reserve {
        row: String,
        number: u32,
        holder_id: Uuid,
        ttl_seconds: u64,
    },
    /// Give a held seat back voluntarily.
    Release {
        row: String,
        number: u32,
    },
    /// Convert an active hold into a sale. Invoked by the ticket/payment
    /// collaborator once payment settles.
    ConfirmSale {
        row: String,
        number: u32,
        holder_id: Uuid,
    },
    /// Compensating flow only: return a sold seat to the pool after a
    /// cancellation or refund.
    CancelSale {
        row: String,
        number: u32,
    },
    /// Reaper path: release the seat iff its hold was expired as of `as_of`.
    /// A no-op on any other state, so concurrent reaper replicas are safe.
    ReclaimExpired {
        row: String,
        number: u32,
        as_of: DateTime<Utc>,
    },
}
