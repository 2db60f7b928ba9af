use super::value_objects::SeatNumber;

// ============================================================================
// Seat Map Business Rule Errors
// ============================================================================

/// How a caller should react to a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong; retrying unchanged will fail again.
    Validation,
    /// Another buyer or flow won the race; retry with a different seat.
    Conflict,
}

#[derive(Debug, thiserror::Error)]
pub enum SeatMapError {
    #[error("seat map already exists")]
    MapAlreadyExists,

    #[error("category already exists: {0}")]
    DuplicateCategory(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("seat already exists: {0}")]
    DuplicateSeat(SeatNumber),

    #[error("unknown seat: {0}")]
    UnknownSeat(SeatNumber),

    #[error("seat is not available: {0}")]
    SeatNotAvailable(SeatNumber),

    #[error("seat is not held: {0}")]
    SeatNotHeld(SeatNumber),

    #[error("hold is expired or belongs to another buyer: {0}")]
    HoldExpiredOrMismatched(SeatNumber),

    #[error("seat is not sold: {0}")]
    SeatNotSold(SeatNumber),

    #[error("seat map not initialized")]
    NotInitialized,
}

impl SeatMapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SeatMapError::MapAlreadyExists
            | SeatMapError::DuplicateCategory(_)
            | SeatMapError::UnknownCategory(_)
            | SeatMapError::DuplicateSeat(_)
            | SeatMapError::UnknownSeat(_)
            | SeatMapError::NotInitialized => ErrorKind::Validation,

            SeatMapError::SeatNotAvailable(_)
            | SeatMapError::SeatNotHeld(_)
            | SeatMapError::HoldExpiredOrMismatched(_)
            | SeatMapError::SeatNotSold(_) => ErrorKind::Conflict,
        }
    }
}
