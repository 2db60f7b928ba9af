// ============================================================================
// Seat Map Domain - Business Logic
// ============================================================================
//
// ALL seat-map-specific code lives here:
// - Value objects (SeatNumber, Category, Hold, Seat)
// - Events (MapaAsientosCreado, AsientoReservado, ... on the wire)
// - Commands (CreateMap, Reserve, Release, ...)
// - Errors (SeatMapError with conflict/validation classification)
// - Aggregate (SeatMapAggregate)
// - Command handler (SeatMapCommandHandler)
//
// Completely separate from the generic event sourcing infrastructure.
//
// ============================================================================

pub mod aggregate;
pub mod command_handler;
pub mod commands;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use aggregate::*;
pub use command_handler::*;
pub use commands::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
