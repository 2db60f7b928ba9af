use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::DomainEvent;

// ============================================================================
// Seat Map Events
// ============================================================================
//
// The wire names (`MapaAsientosCreado`, `AsientoReservado`, ...) are the
// platform's published contract and must stay stable; the Rust types use
// English names and map to the wire via serde renames.
//
// Every event is denormalized: map id, owning event id, seat position and
// pricing travel with the event so consumers never call back into this
// service.
//
// ============================================================================

/// Union type for all seat map events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SeatMapEvent {
    #[serde(rename = "MapaAsientosCreado")]
    MapCreated(SeatMapCreated),
    #[serde(rename = "CategoriaAgregada")]
    CategoryAdded(CategoryAdded),
    #[serde(rename = "AsientoAgregado")]
    SeatAdded(SeatAdded),
    #[serde(rename = "AsientoReservado")]
    SeatReserved(SeatReserved),
    #[serde(rename = "AsientoLiberado")]
    SeatReleased(SeatReleased),
    #[serde(rename = "AsientoVendido")]
    SeatSold(SeatSold),
}

impl DomainEvent for SeatMapEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SeatMapEvent::MapCreated(_) => "MapaAsientosCreado",
            SeatMapEvent::CategoryAdded(_) => "CategoriaAgregada",
            SeatMapEvent::SeatAdded(_) => "AsientoAgregado",
            SeatMapEvent::SeatReserved(_) => "AsientoReservado",
            SeatMapEvent::SeatReleased(_) => "AsientoLiberado",
            SeatMapEvent::SeatSold(_) => "AsientoVendido",
        }
    }
}

impl SeatMapEvent {
    /// Owning event (concert, match, ...) this seat map belongs to.
    pub fn owning_event_id(&self) -> Uuid {
        match self {
            SeatMapEvent::MapCreated(e) => e.event_id,
            SeatMapEvent::CategoryAdded(e) => e.event_id,
            SeatMapEvent::SeatAdded(e) => e.event_id,
            SeatMapEvent::SeatReserved(e) => e.event_id,
            SeatMapEvent::SeatReleased(e) => e.event_id,
            SeatMapEvent::SeatSold(e) => e.event_id,
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// First event in a map's lifecycle.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeatMapCreated {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "capacidadTotal")]
    pub total_capacity: u32,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CategoryAdded {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precioBase")]
    pub base_price: f64,
    #[serde(rename = "esPremium")]
    pub is_premium: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeatAdded {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "fila")]
    pub row: String,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "categoria")]
    pub category: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeatReserved {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "fila")]
    pub row: String,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "usuarioId")]
    pub holder_id: Uuid,
    #[serde(rename = "categoriaAsiento")]
    pub category: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "fechaReserva")]
    pub reserved_at: DateTime<Utc>,
    #[serde(rename = "expiraEn")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeatReleased {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "fila")]
    pub row: String,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "fechaLiberacion")]
    pub released_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeatSold {
    #[serde(rename = "mapId")]
    pub map_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "fila")]
    pub row: String,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "usuarioId")]
    pub holder_id: Uuid,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "fechaVenta")]
    pub sold_at: DateTime<Utc>,
}

// ============================================================================
// Unit Tests
// ============================================================================
