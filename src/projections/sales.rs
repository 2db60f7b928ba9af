use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use super::{ApplyOutcome, Projection, ProjectionError};
use crate::domain::seat_map::SeatMapEvent;
use crate::event_sourcing::EventEnvelope;

// ============================================================================
// Daily Sales Projection
// ============================================================================
//
// Aggregates confirmed sales per calendar day. The increment is guarded by a
// seen-event-id set stored alongside each daily document: a redelivered
// `AsientoVendido` is skipped instead of double-counted. A blind increment
// would silently inflate totals under at-least-once delivery.
//
// ============================================================================

/// Read model row for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySalesTotals {
    pub date: NaiveDate,
    pub tickets_sold: u64,
    pub total_amount: f64,
}

struct DailyDoc {
    totals: DailySalesTotals,
    // Idempotency ledger persisted with the document.
    seen_events: HashSet<Uuid>,
}

#[derive(Default)]
pub struct DailySalesProjection {
    docs: Mutex<HashMap<NaiveDate, DailyDoc>>,
}

impl DailySalesProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals_for(&self, date: NaiveDate) -> Option<DailySalesTotals> {
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        docs.get(&date).map(|d| d.totals.clone())
    }

    pub fn grand_total(&self) -> f64 {
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        docs.values().map(|d| d.totals.total_amount).sum()
    }
}

#[async_trait]
impl Projection for DailySalesProjection {
    fn name(&self) -> &'static str {
        "daily-sales"
    }

    async fn apply(&self, payload: &str) -> Result<ApplyOutcome, ProjectionError> {
        let envelope: EventEnvelope<SeatMapEvent> = serde_json::from_str(payload)
            .map_err(|e| ProjectionError::Malformed(e.to_string()))?;

        let sold = match &envelope.event_data {
            SeatMapEvent::SeatSold(e) => e,
            // Reservations, releases and map growth do not touch revenue.
            _ => return Ok(ApplyOutcome::Skipped),
        };

        let date = sold.sold_at.date_naive();
        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        let doc = docs.entry(date).or_insert_with(|| DailyDoc {
            totals: DailySalesTotals {
                date,
                tickets_sold: 0,
                total_amount: 0.0,
            },
            seen_events: HashSet::new(),
        });

        if !doc.seen_events.insert(envelope.event_id) {
            tracing::debug!(
                event_id = %envelope.event_id,
                date = %date,
                "duplicate sale delivery skipped"
            );
            return Ok(ApplyOutcome::Skipped);
        }

        doc.totals.tickets_sold += 1;
        doc.totals.total_amount += sold.price;

        tracing::debug!(
            date = %date,
            tickets_sold = doc.totals.tickets_sold,
            "sale applied to daily totals"
        );

        Ok(ApplyOutcome::Applied)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::seat_map::SeatSold;
    use chrono::Utc;

    fn sold_envelope(price: f64) -> String {
        let map_id = Uuid::new_v4();
        let event = SeatMapEvent::SeatSold(SeatSold {
            map_id,
            event_id: Uuid::new_v4(),
            row: "A".to_string(),
            number: 1,
            holder_id: Uuid::new_v4(),
            price,
            sold_at: Utc::now(),
        });
        serde_json::to_string(&EventEnvelope::wrap(map_id, 1, event, Uuid::new_v4())).unwrap()
    }

    #[tokio::test]
    async fn test_sale_increments_daily_totals() {
        let projection = DailySalesProjection::new();
        let today = Utc::now().date_naive();

        projection.apply(&sold_envelope(150.0)).await.unwrap();
        projection.apply(&sold_envelope(40.0)).await.unwrap();

        let totals = projection.totals_for(today).unwrap();
        assert_eq!(totals.tickets_sold, 2);
        assert_eq!(totals.total_amount, 190.0);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_counted_once() {
        let projection = DailySalesProjection::new();
        let today = Utc::now().date_naive();
        let payload = sold_envelope(150.0);

        assert_eq!(
            projection.apply(&payload).await.unwrap(),
            ApplyOutcome::Applied
        );
        assert_eq!(
            projection.apply(&payload).await.unwrap(),
            ApplyOutcome::Skipped
        );

        let totals = projection.totals_for(today).unwrap();
        assert_eq!(totals.tickets_sold, 1);
        assert_eq!(totals.total_amount, 150.0);
    }

    #[tokio::test]
    async fn test_non_sale_events_are_skipped() {
        use crate::domain::seat_map::SeatReserved;

        let projection = DailySalesProjection::new();
        let map_id = Uuid::new_v4();
        let now = Utc::now();
        let event = SeatMapEvent::SeatReserved(SeatReserved {
            map_id,
            event_id: Uuid::new_v4(),
            row: "A".to_string(),
            number: 1,
            holder_id: Uuid::new_v4(),
            category: "VIP".to_string(),
            price: 150.0,
            reserved_at: now,
            expires_at: now,
        });
        let payload =
            serde_json::to_string(&EventEnvelope::wrap(map_id, 1, event, Uuid::new_v4())).unwrap();

        assert_eq!(
            projection.apply(&payload).await.unwrap(),
            ApplyOutcome::Skipped
        );
        assert!(projection.totals_for(now.date_naive()).is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_reported() {
        let projection = DailySalesProjection::new();
        let err = projection.apply("{not json").await.unwrap_err();
        assert!(matches!(err, ProjectionError::Malformed(_)));
    }
}
