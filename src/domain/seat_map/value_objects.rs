use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Seat Map Value Objects
// ============================================================================

/// Physical position of a seat within a map. Unique per map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatNumber {
    pub row: String,
    pub number: u32,
}

impl SeatNumber {
    pub fn new(row: impl Into<String>, number: u32) -> Self {
        Self {
            row: row.into(),
            number,
        }
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.number)
    }
}

/// Pricing category. Seats reference a category by name, never by pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub base_price: f64,
    pub is_premium: bool,
}

/// Lifecycle state of one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatState {
    Available,
    Held,
    Sold,
}

/// A time-limited exclusive claim on a seat pending purchase confirmation.
///
/// A hold is logically void the instant it expires, even before the reaper
/// physically reclaims the seat. Every decision about a hold goes through
/// [`Hold::is_active`]; nothing may honor a stale hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    pub holder_id: Uuid,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(holder_id: Uuid, acquired_at: DateTime<Utc>, ttl_seconds: u64) -> Self {
        Self {
            holder_id,
            acquired_at,
            expires_at: acquired_at + Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Pure function of `now`; callers pass the clock in.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }

    /// An active hold owned by `holder_id`.
    pub fn is_active_for(&self, holder_id: Uuid, now: DateTime<Utc>) -> bool {
        self.holder_id == holder_id && self.is_active(now)
    }
}

/// One seat entity inside the map's index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub number: SeatNumber,
    pub category: String,
    pub state: SeatState,
    pub hold: Option<Hold>,
}

impl Seat {
    pub fn new(number: SeatNumber, category: impl Into<String>) -> Self {
        Self {
            number,
            category: category.into(),
            state: SeatState::Available,
            hold: None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
