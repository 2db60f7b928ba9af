use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

// ============================================================================
// Realtime Hub
// ============================================================================
//
// Fan-out of live seat changes to viewers of one event, and of personal
// notifications to one user. Group membership is explicit join/leave; a
// client that vanishes without leaving is pruned when a push finds its
// channel closed (the transport's ping/reconnect owns liveness, not this
// component).
//
// Pushing to a group with zero members is a successful no-op.
//
// ============================================================================

pub type ClientId = Uuid;

/// Server-to-client push. Wire names match the platform's realtime contract.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum PushMessage {
    #[serde(rename = "AsientoReservado")]
    SeatReserved {
        #[serde(rename = "seatId")]
        seat_id: String,
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    #[serde(rename = "AsientoLiberado")]
    SeatReleased {
        #[serde(rename = "seatId")]
        seat_id: String,
    },
    #[serde(rename = "RecibirNotificacion")]
    Notification { payload: serde_json::Value },
}

#[derive(Default)]
struct Groups {
    event_groups: HashMap<Uuid, HashMap<ClientId, mpsc::UnboundedSender<PushMessage>>>,
    user_groups: HashMap<Uuid, HashMap<ClientId, mpsc::UnboundedSender<PushMessage>>>,
}

#[derive(Default)]
pub struct RealtimeHub {
    inner: Mutex<Groups>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the viewer group of one event. The returned receiver is the
    /// client's push channel.
    pub fn join_event(
        &self,
        event_id: Uuid,
        client_id: ClientId,
    ) -> mpsc::UnboundedReceiver<PushMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .event_groups
            .entry(event_id)
            .or_default()
            .insert(client_id, tx);
        tracing::debug!(event_id = %event_id, client_id = %client_id, "client joined event group");
        rx
    }

    pub fn leave_event(&self, event_id: Uuid, client_id: ClientId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(group) = inner.event_groups.get_mut(&event_id) {
            group.remove(&client_id);
            if group.is_empty() {
                inner.event_groups.remove(&event_id);
            }
        }
        tracing::debug!(event_id = %event_id, client_id = %client_id, "client left event group");
    }

    /// Join the personal notification group of one user.
    pub fn join_user(
        &self,
        user_id: Uuid,
        client_id: ClientId,
    ) -> mpsc::UnboundedReceiver<PushMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .user_groups
            .entry(user_id)
            .or_default()
            .insert(client_id, tx);
        rx
    }

    pub fn leave_user(&self, user_id: Uuid, client_id: ClientId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(group) = inner.user_groups.get_mut(&user_id) {
            group.remove(&client_id);
            if group.is_empty() {
                inner.user_groups.remove(&user_id);
            }
        }
    }

    /// Push to every member of an event group. Returns the delivery count.
    pub fn push_to_event(&self, event_id: Uuid, message: PushMessage) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::fan_out(&mut inner.event_groups, event_id, message)
    }

    /// Push a personal notification to every connection of one user.
    pub fn notify_user(&self, user_id: Uuid, payload: serde_json::Value) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::fan_out(
            &mut inner.user_groups,
            user_id,
            PushMessage::Notification { payload },
        )
    }

    pub fn event_group_size(&self, event_id: Uuid) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.event_groups.get(&event_id).map_or(0, |g| g.len())
    }

    fn fan_out(
        groups: &mut HashMap<Uuid, HashMap<ClientId, mpsc::UnboundedSender<PushMessage>>>,
        group_id: Uuid,
        message: PushMessage,
    ) -> usize {
        let Some(group) = groups.get_mut(&group_id) else {
            return 0;
        };

        let before = group.len();
        // Closed channels are members that disconnected without leaving.
        group.retain(|_, tx| tx.send(message.clone()).is_ok());
        let delivered = group.len();

        if delivered < before {
            tracing::debug!(
                group_id = %group_id,
                pruned = before - delivered,
                "pruned disconnected group members"
            );
        }
        if group.is_empty() {
            groups.remove(&group_id);
        }

        delivered
    }
}

// ============================================================================
// Tests
// ============================================================================
