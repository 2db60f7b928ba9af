// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// One subdirectory per aggregate with its value objects, events, commands,
// errors, aggregate implementation and command handler.
//
// ============================================================================

pub mod seat_map;
