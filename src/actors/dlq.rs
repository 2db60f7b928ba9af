use actix::prelude::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ============================================================================
// Dead Letter Queue
// ============================================================================
//
// Terminal parking spot for poison events: deliveries a projection kept
// failing on after all retries. Stored for manual inspection and replay so a
// bad event never blocks its partition.
//
// `DeadLetterStore` is the plain storage used directly by projection
// runners; `DlqActor` exposes it to the actor system for querying.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub id: Uuid,
    /// Projection that gave up on the delivery.
    pub consumer: String,
    pub topic: String,
    pub key: String,
    pub payload: String,
    pub error: String,
    pub failure_count: u32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DlqStats {
    pub total_messages: usize,
    pub by_consumer: HashMap<String, usize>,
}

#[derive(Default)]
pub struct DeadLetterStore {
    letters: Mutex<Vec<DeadLetter>>,
}

impl DeadLetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, letter: DeadLetter) {
        tracing::error!(
            dlq_id = %letter.id,
            consumer = %letter.consumer,
            topic = %letter.topic,
            key = %letter.key,
            error = %letter.error,
            failure_count = letter.failure_count,
            "message parked in dead letter queue"
        );
        let mut letters = self.letters.lock().unwrap_or_else(|e| e.into_inner());
        letters.push(letter);
    }

    pub fn letters(&self, limit: usize) -> Vec<DeadLetter> {
        let letters = self.letters.lock().unwrap_or_else(|e| e.into_inner());
        letters.iter().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> DlqStats {
        let letters = self.letters.lock().unwrap_or_else(|e| e.into_inner());
        let mut by_consumer: HashMap<String, usize> = HashMap::new();
        for letter in letters.iter() {
            *by_consumer.entry(letter.consumer.clone()).or_default() += 1;
        }
        DlqStats {
            total_messages: letters.len(),
            by_consumer,
        }
    }

    pub fn len(&self) -> usize {
        let letters = self.letters.lock().unwrap_or_else(|e| e.into_inner());
        letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Actor surface
// ============================================================================

pub struct DlqActor {
    store: Arc<DeadLetterStore>,
}

impl DlqActor {
    pub fn new(store: Arc<DeadLetterStore>) -> Self {
        Self { store }
    }
}

impl Actor for DlqActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("DlqActor started, dead letter queue ready");
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct AddToDlq(pub DeadLetter);

#[derive(Message)]
#[rtype(result = "Vec<DeadLetter>")]
pub struct GetDlqMessages {
    pub limit: usize,
}

#[derive(Message)]
#[rtype(result = "DlqStats")]
pub struct GetDlqStats;

impl Handler<AddToDlq> for DlqActor {
    type Result = ();

    fn handle(&mut self, msg: AddToDlq, _: &mut Self::Context) {
        self.store.push(msg.0);
    }
}

impl Handler<GetDlqMessages> for DlqActor {
    type Result = MessageResult<GetDlqMessages>;

    fn handle(&mut self, msg: GetDlqMessages, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.store.letters(msg.limit))
    }
}

impl Handler<GetDlqStats> for DlqActor {
    type Result = MessageResult<GetDlqStats>;

    fn handle(&mut self, _: GetDlqStats, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.store.stats())
    }
}

// ============================================================================
// Tests
// ============================================================================
