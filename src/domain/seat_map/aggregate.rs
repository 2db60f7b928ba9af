use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::commands::SeatMapCommand;
use super::errors::SeatMapError;
use super::events::*;
use super::value_objects::{Category, Hold, Seat, SeatNumber, SeatState};
use crate::event_sourcing::Aggregate;

// ============================================================================
// Seat Map Aggregate - Domain Logic
// ============================================================================
//
// Consistency boundary for one event's seat inventory. Owns the category
// list (append-only) and the seat index keyed by (row, number); seats refer
// to categories by name, so the object graph stays acyclic.
//
// State transitions per seat:
//   Available -> Held        reserve (also reclaims an expired hold)
//   Held      -> Available   release / expiry reclaim
//   Held      -> Sold        confirm with an ACTIVE hold by the same buyer
//   Sold      -> Available   compensating cancel flow only
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current state (derived from events)
    pub event_id: Uuid,
    pub total_capacity: u32,
    pub categories: Vec<Category>,
    pub seats: HashMap<SeatNumber, Seat>,

    pub created_at: DateTime<Utc>,
}

impl SeatMapAggregate {
    /// Genesis path: events for a map that does not exist yet.
    pub fn handle_create(map_id: Uuid, event_id: Uuid, total_capacity: u32) -> Vec<SeatMapEvent> {
        vec![SeatMapEvent::MapCreated(SeatMapCreated {
            map_id,
            event_id,
            total_capacity,
            created_at: Utc::now(),
        })]
    }

    fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    fn seat(&self, row: &str, number: u32) -> Result<&Seat, SeatMapError> {
        let key = SeatNumber::new(row, number);
        self.seats
            .get(&key)
            .ok_or(SeatMapError::UnknownSeat(key))
    }

    fn seat_price(&self, seat: &Seat) -> Result<f64, SeatMapError> {
        self.category(&seat.category)
            .map(|c| c.base_price)
            .ok_or_else(|| SeatMapError::UnknownCategory(seat.category.clone()))
    }

    /// Seats currently `Held` whose hold was expired as of `as_of`.
    pub fn expired_holds(&self, as_of: DateTime<Utc>) -> Vec<SeatNumber> {
        self.seats
            .values()
            .filter(|s| {
                s.state == SeatState::Held
                    && s.hold.as_ref().is_some_and(|h| h.is_expired(as_of))
            })
            .map(|s| s.number.clone())
            .collect()
    }

    fn released_event(&self, seat: &Seat, released_at: DateTime<Utc>) -> SeatMapEvent {
        SeatMapEvent::SeatReleased(SeatReleased {
            map_id: self.id,
            event_id: self.event_id,
            row: seat.number.row.clone(),
            number: seat.number.number,
            released_at,
        })
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for SeatMapAggregate {
    type Event = SeatMapEvent;
    type Command = SeatMapCommand;
    type Error = SeatMapError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            SeatMapEvent::MapCreated(e) => Ok(Self {
                id: aggregate_id,
                version: 0,
                event_id: e.event_id,
                total_capacity: e.total_capacity,
                categories: Vec::new(),
                seats: HashMap::new(),
                created_at: e.created_at,
            }),
            _ => Err(SeatMapError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            SeatMapEvent::MapCreated(_) => Ok(()),

            SeatMapEvent::CategoryAdded(e) => {
                self.categories.push(Category {
                    name: e.name.clone(),
                    base_price: e.base_price,
                    is_premium: e.is_premium,
                });
                Ok(())
            }

            SeatMapEvent::SeatAdded(e) => {
                let key = SeatNumber::new(&e.row, e.number);
                self.seats
                    .insert(key.clone(), Seat::new(key, e.category.clone()));
                Ok(())
            }

            SeatMapEvent::SeatReserved(e) => {
                let key = SeatNumber::new(&e.row, e.number);
                let seat = self
                    .seats
                    .get_mut(&key)
                    .ok_or(SeatMapError::UnknownSeat(key))?;
                seat.state = SeatState::Held;
                seat.hold = Some(Hold {
                    holder_id: e.holder_id,
                    acquired_at: e.reserved_at,
                    expires_at: e.expires_at,
                });
                Ok(())
            }

            SeatMapEvent::SeatReleased(e) => {
                let key = SeatNumber::new(&e.row, e.number);
                let seat = self
                    .seats
                    .get_mut(&key)
                    .ok_or(SeatMapError::UnknownSeat(key))?;
                seat.state = SeatState::Available;
                seat.hold = None;
                Ok(())
            }

            SeatMapEvent::SeatSold(e) => {
                let key = SeatNumber::new(&e.row, e.number);
                let seat = self
                    .seats
                    .get_mut(&key)
                    .ok_or(SeatMapError::UnknownSeat(key))?;
                seat.state = SeatState::Sold;
                seat.hold = None;
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SeatMapCommand::CreateMap { .. } => Err(SeatMapError::MapAlreadyExists),

            SeatMapCommand::AddCategory {
                name,
                base_price,
                is_premium,
            } => {
                if self.category(name).is_some() {
                    return Err(SeatMapError::DuplicateCategory(name.clone()));
                }

                Ok(vec![SeatMapEvent::CategoryAdded(CategoryAdded {
                    map_id: self.id,
                    event_id: self.event_id,
                    name: name.clone(),
                    base_price: *base_price,
                    is_premium: *is_premium,
                })])
            }

            SeatMapCommand::AddSeat {
                row,
                number,
                category,
            } => {
                if self.category(category).is_none() {
                    return Err(SeatMapError::UnknownCategory(category.clone()));
                }

                let key = SeatNumber::new(row, *number);
                if self.seats.contains_key(&key) {
                    return Err(SeatMapError::DuplicateSeat(key));
                }

                Ok(vec![SeatMapEvent::SeatAdded(SeatAdded {
                    map_id: self.id,
                    event_id: self.event_id,
                    row: row.clone(),
                    number: *number,
                    category: category.clone(),
                })])
            }

            SeatMapCommand::Reserve {
                row,
                number,
                holder_id,
                ttl_seconds,
            } => {
                let seat = self.seat(row, *number)?;
                let now = Utc::now();

                match seat.state {
                    SeatState::Available => {}
                    // A stale hold is void; the seat is reclaimed for the
                    // new buyer without waiting for the reaper.
                    SeatState::Held
                        if seat.hold.as_ref().is_some_and(|h| h.is_expired(now)) => {}
                    SeatState::Held | SeatState::Sold => {
                        return Err(SeatMapError::SeatNotAvailable(seat.number.clone()));
                    }
                }

                let price = self.seat_price(seat)?;
                let hold = Hold::new(*holder_id, now, *ttl_seconds);

                Ok(vec![SeatMapEvent::SeatReserved(SeatReserved {
                    map_id: self.id,
                    event_id: self.event_id,
                    row: row.clone(),
                    number: *number,
                    holder_id: *holder_id,
                    category: seat.category.clone(),
                    price,
                    reserved_at: hold.acquired_at,
                    expires_at: hold.expires_at,
                })])
            }

            SeatMapCommand::Release { row, number } => {
                let seat = self.seat(row, *number)?;

                if seat.state != SeatState::Held {
                    return Err(SeatMapError::SeatNotHeld(seat.number.clone()));
                }

                Ok(vec![self.released_event(seat, Utc::now())])
            }

            SeatMapCommand::ConfirmSale {
                row,
                number,
                holder_id,
            } => {
                let seat = self.seat(row, *number)?;
                let now = Utc::now();

                let active_for_holder = seat.state == SeatState::Held
                    && seat
                        .hold
                        .as_ref()
                        .is_some_and(|h| h.is_active_for(*holder_id, now));

                if !active_for_holder {
                    return Err(SeatMapError::HoldExpiredOrMismatched(seat.number.clone()));
                }

                let price = self.seat_price(seat)?;

                Ok(vec![SeatMapEvent::SeatSold(SeatSold {
                    map_id: self.id,
                    event_id: self.event_id,
                    row: row.clone(),
                    number: *number,
                    holder_id: *holder_id,
                    price,
                    sold_at: now,
                })])
            }

            SeatMapCommand::CancelSale { row, number } => {
                let seat = self.seat(row, *number)?;

                if seat.state != SeatState::Sold {
                    return Err(SeatMapError::SeatNotSold(seat.number.clone()));
                }

                Ok(vec![self.released_event(seat, Utc::now())])
            }

            SeatMapCommand::ReclaimExpired { row, number, as_of } => {
                let seat = self.seat(row, *number)?;

                // State check, not locking: any state other than
                // Held-with-expired-hold means another replica (or the buyer)
                // already resolved this seat. Emitting nothing keeps the
                // reclaim idempotent.
                let expired = seat.state == SeatState::Held
                    && seat.hold.as_ref().is_some_and(|h| h.is_expired(*as_of));

                if !expired {
                    return Ok(vec![]);
                }

                Ok(vec![self.released_event(seat, Utc::now())])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn created_map() -> SeatMapAggregate {
        let map_id = Uuid::new_v4();
        let event = SeatMapEvent::MapCreated(SeatMapCreated {
            map_id,
            event_id: Uuid::new_v4(),
            total_capacity: 100,
            created_at: Utc::now(),
        });
        SeatMapAggregate::apply_first_event(map_id, &event).unwrap()
    }

    fn map_with_vip_seat() -> SeatMapAggregate {
        let mut aggregate = created_map();
        let events = aggregate
            .handle_command(&SeatMapCommand::AddCategory {
                name: "VIP".to_string(),
                base_price: 150.0,
                is_premium: true,
            })
            .unwrap();
        apply_all(&mut aggregate, events);
        let events = aggregate
            .handle_command(&SeatMapCommand::AddSeat {
                row: "A".to_string(),
                number: 1,
                category: "VIP".to_string(),
            })
            .unwrap();
        apply_all(&mut aggregate, events);
        aggregate
    }

    fn apply_all(aggregate: &mut SeatMapAggregate, events: Vec<SeatMapEvent>) {
        for event in &events {
            aggregate.apply_event(event).unwrap();
        }
    }

    /// Puts the seat into `Held` with a hold that expired in the past.
    fn apply_expired_hold(aggregate: &mut SeatMapAggregate, holder_id: Uuid) {
        let reserved_at = Utc::now() - Duration::minutes(10);
        aggregate
            .apply_event(&SeatMapEvent::SeatReserved(SeatReserved {
                map_id: aggregate.id,
                event_id: aggregate.event_id,
                row: "A".to_string(),
                number: 1,
                holder_id,
                category: "VIP".to_string(),
                price: 150.0,
                reserved_at,
                expires_at: reserved_at + Duration::minutes(5),
            }))
            .unwrap();
    }

    #[test]
    fn test_map_creation_from_first_event() {
        let aggregate = created_map();
        assert_eq!(aggregate.total_capacity, 100);
        assert!(aggregate.categories.is_empty());
        assert!(aggregate.seats.is_empty());
    }

    #[test]
    fn test_first_event_must_be_map_created() {
        let result = SeatMapAggregate::apply_first_event(
            Uuid::new_v4(),
            &SeatMapEvent::SeatAdded(SeatAdded {
                map_id: Uuid::new_v4(),
                event_id: Uuid::new_v4(),
                row: "A".to_string(),
                number: 1,
                category: "VIP".to_string(),
            }),
        );
        assert!(matches!(result, Err(SeatMapError::NotInitialized)));
    }

    #[test]
    fn test_create_on_existing_map_fails() {
        let aggregate = created_map();
        let result = aggregate.handle_command(&SeatMapCommand::CreateMap {
            event_id: Uuid::new_v4(),
            total_capacity: 10,
        });
        assert!(matches!(result, Err(SeatMapError::MapAlreadyExists)));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let aggregate = map_with_vip_seat();
        let result = aggregate.handle_command(&SeatMapCommand::AddCategory {
            name: "VIP".to_string(),
            base_price: 200.0,
            is_premium: true,
        });
        assert!(matches!(result, Err(SeatMapError::DuplicateCategory(_))));
    }

    #[test]
    fn test_add_seat_requires_existing_category() {
        let aggregate = created_map();
        let result = aggregate.handle_command(&SeatMapCommand::AddSeat {
            row: "A".to_string(),
            number: 1,
            category: "Palco".to_string(),
        });
        assert!(matches!(result, Err(SeatMapError::UnknownCategory(_))));
    }

    #[test]
    fn test_duplicate_seat_rejected() {
        let aggregate = map_with_vip_seat();
        let result = aggregate.handle_command(&SeatMapCommand::AddSeat {
            row: "A".to_string(),
            number: 1,
            category: "VIP".to_string(),
        });
        assert!(matches!(result, Err(SeatMapError::DuplicateSeat(_))));
    }

    #[test]
    fn test_reserve_available_seat() {
        let aggregate = map_with_vip_seat();
        let holder = Uuid::new_v4();

        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
                ttl_seconds: 300,
            })
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            SeatMapEvent::SeatReserved(e) => {
                assert_eq!(e.holder_id, holder);
                assert_eq!(e.category, "VIP");
                assert_eq!(e.price, 150.0);
                assert_eq!(e.expires_at, e.reserved_at + Duration::seconds(300));
            }
            other => panic!("expected SeatReserved, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_seat_is_held_after_apply() {
        let mut aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let seat = &aggregate.seats[&SeatNumber::new("A", 1)];
        assert_eq!(seat.state, SeatState::Held);
        assert!(seat.hold.is_some());
    }

    #[test]
    fn test_reserve_held_seat_conflicts() {
        let mut aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let result = aggregate.handle_command(&SeatMapCommand::Reserve {
            row: "A".to_string(),
            number: 1,
            holder_id: Uuid::new_v4(),
            ttl_seconds: 300,
        });
        assert!(matches!(result, Err(SeatMapError::SeatNotAvailable(_))));
    }

    #[test]
    fn test_reserve_reclaims_expired_hold() {
        let mut aggregate = map_with_vip_seat();
        apply_expired_hold(&mut aggregate, Uuid::new_v4());

        let new_holder = Uuid::new_v4();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: new_holder,
                ttl_seconds: 300,
            })
            .unwrap();

        match &events[0] {
            SeatMapEvent::SeatReserved(e) => assert_eq!(e.holder_id, new_holder),
            other => panic!("expected SeatReserved, got {:?}", other),
        }
    }

    #[test]
    fn test_reserve_sold_seat_conflicts() {
        let mut aggregate = map_with_vip_seat();
        let holder = Uuid::new_v4();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);
        let events = aggregate
            .handle_command(&SeatMapCommand::ConfirmSale {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let result = aggregate.handle_command(&SeatMapCommand::Reserve {
            row: "A".to_string(),
            number: 1,
            holder_id: Uuid::new_v4(),
            ttl_seconds: 300,
        });
        assert!(matches!(result, Err(SeatMapError::SeatNotAvailable(_))));
    }

    #[test]
    fn test_release_held_seat() {
        let mut aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let events = aggregate
            .handle_command(&SeatMapCommand::Release {
                row: "A".to_string(),
                number: 1,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let seat = &aggregate.seats[&SeatNumber::new("A", 1)];
        assert_eq!(seat.state, SeatState::Available);
        assert!(seat.hold.is_none());
    }

    #[test]
    fn test_release_unheld_seat_fails_and_leaves_state() {
        let aggregate = map_with_vip_seat();

        let result = aggregate.handle_command(&SeatMapCommand::Release {
            row: "A".to_string(),
            number: 1,
        });
        assert!(matches!(result, Err(SeatMapError::SeatNotHeld(_))));

        let seat = &aggregate.seats[&SeatNumber::new("A", 1)];
        assert_eq!(seat.state, SeatState::Available);
    }

    #[test]
    fn test_confirm_sale_with_active_hold() {
        let mut aggregate = map_with_vip_seat();
        let holder = Uuid::new_v4();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let events = aggregate
            .handle_command(&SeatMapCommand::ConfirmSale {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
            })
            .unwrap();

        match &events[0] {
            SeatMapEvent::SeatSold(e) => {
                assert_eq!(e.holder_id, holder);
                assert_eq!(e.price, 150.0);
            }
            other => panic!("expected SeatSold, got {:?}", other),
        }

        apply_all(&mut aggregate, events);
        let seat = &aggregate.seats[&SeatNumber::new("A", 1)];
        assert_eq!(seat.state, SeatState::Sold);
        assert!(seat.hold.is_none());
    }

    #[test]
    fn test_confirm_sale_rejects_expired_hold() {
        let mut aggregate = map_with_vip_seat();
        let holder = Uuid::new_v4();
        apply_expired_hold(&mut aggregate, holder);

        let result = aggregate.handle_command(&SeatMapCommand::ConfirmSale {
            row: "A".to_string(),
            number: 1,
            holder_id: holder,
        });
        assert!(matches!(
            result,
            Err(SeatMapError::HoldExpiredOrMismatched(_))
        ));
    }

    #[test]
    fn test_confirm_sale_rejects_other_buyer() {
        let mut aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let result = aggregate.handle_command(&SeatMapCommand::ConfirmSale {
            row: "A".to_string(),
            number: 1,
            holder_id: Uuid::new_v4(),
        });
        assert!(matches!(
            result,
            Err(SeatMapError::HoldExpiredOrMismatched(_))
        ));
    }

    #[test]
    fn test_cancel_sale_returns_seat_to_pool() {
        let mut aggregate = map_with_vip_seat();
        let holder = Uuid::new_v4();
        for command in [
            SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
                ttl_seconds: 300,
            },
            SeatMapCommand::ConfirmSale {
                row: "A".to_string(),
                number: 1,
                holder_id: holder,
            },
        ] {
            let events = aggregate.handle_command(&command).unwrap();
            apply_all(&mut aggregate, events);
        }

        let events = aggregate
            .handle_command(&SeatMapCommand::CancelSale {
                row: "A".to_string(),
                number: 1,
            })
            .unwrap();
        assert!(matches!(&events[0], SeatMapEvent::SeatReleased(_)));

        apply_all(&mut aggregate, events);
        let seat = &aggregate.seats[&SeatNumber::new("A", 1)];
        assert_eq!(seat.state, SeatState::Available);
    }

    #[test]
    fn test_cancel_sale_on_unsold_seat_fails() {
        let aggregate = map_with_vip_seat();
        let result = aggregate.handle_command(&SeatMapCommand::CancelSale {
            row: "A".to_string(),
            number: 1,
        });
        assert!(matches!(result, Err(SeatMapError::SeatNotSold(_))));
    }

    #[test]
    fn test_reclaim_expired_hold_releases_seat() {
        let mut aggregate = map_with_vip_seat();
        apply_expired_hold(&mut aggregate, Uuid::new_v4());

        let events = aggregate
            .handle_command(&SeatMapCommand::ReclaimExpired {
                row: "A".to_string(),
                number: 1,
                as_of: Utc::now(),
            })
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SeatMapEvent::SeatReleased(_)));
    }

    #[test]
    fn test_reclaim_is_noop_on_available_seat() {
        let aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::ReclaimExpired {
                row: "A".to_string(),
                number: 1,
                as_of: Utc::now(),
            })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_reclaim_is_noop_on_active_hold() {
        let mut aggregate = map_with_vip_seat();
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 1,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 300,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let events = aggregate
            .handle_command(&SeatMapCommand::ReclaimExpired {
                row: "A".to_string(),
                number: 1,
                as_of: Utc::now(),
            })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_double_reclaim_second_pass_emits_nothing() {
        let mut aggregate = map_with_vip_seat();
        apply_expired_hold(&mut aggregate, Uuid::new_v4());

        let first = aggregate
            .handle_command(&SeatMapCommand::ReclaimExpired {
                row: "A".to_string(),
                number: 1,
                as_of: Utc::now(),
            })
            .unwrap();
        apply_all(&mut aggregate, first);

        // A second replica sweeping the same seat finds it Available.
        let second = aggregate
            .handle_command(&SeatMapCommand::ReclaimExpired {
                row: "A".to_string(),
                number: 1,
                as_of: Utc::now(),
            })
            .unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_expired_holds_lists_only_expired() {
        let mut aggregate = created_map();
        let events = aggregate
            .handle_command(&SeatMapCommand::AddCategory {
                name: "VIP".to_string(),
                base_price: 150.0,
                is_premium: true,
            })
            .unwrap();
        apply_all(&mut aggregate, events);
        for number in 1..=2 {
            let events = aggregate
                .handle_command(&SeatMapCommand::AddSeat {
                    row: "A".to_string(),
                    number,
                    category: "VIP".to_string(),
                })
                .unwrap();
            apply_all(&mut aggregate, events);
        }

        // A-1 expired, A-2 active.
        apply_expired_hold(&mut aggregate, Uuid::new_v4());
        let events = aggregate
            .handle_command(&SeatMapCommand::Reserve {
                row: "A".to_string(),
                number: 2,
                holder_id: Uuid::new_v4(),
                ttl_seconds: 600,
            })
            .unwrap();
        apply_all(&mut aggregate, events);

        let expired = aggregate.expired_holds(Utc::now());
        assert_eq!(expired, vec![SeatNumber::new("A", 1)]);
    }

    #[test]
    fn test_unknown_seat_is_rejected() {
        let aggregate = map_with_vip_seat();
        let result = aggregate.handle_command(&SeatMapCommand::Reserve {
            row: "Z".to_string(),
            number: 99,
            holder_id: Uuid::new_v4(),
            ttl_seconds: 300,
        });
        assert!(matches!(result, Err(SeatMapError::UnknownSeat(_))));
    }
}
