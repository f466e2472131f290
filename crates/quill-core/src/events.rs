//! Server event types and event bus for background notifications.
//!
//! Domain operations emit events onto a single broadcast channel; downstream
//! consumers (the email dispatcher, telemetry) subscribe independently.
//! Emission is fire-and-forget: with no subscribers the event is dropped.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Unified server event type.
///
/// Serialized as JSON with a `type` tag field, e.g.
/// `{"type":"NoteCreated","note_id":"...","title":"..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A new account was registered (triggers the welcome email).
    UserRegistered {
        user_id: Uuid,
        email: String,
        first_name: String,
    },
    /// A note was created (triggers the note-created email).
    NoteCreated {
        note_id: Uuid,
        owner_id: Uuid,
        owner_email: String,
        title: String,
    },
    /// A note's content changed.
    NoteUpdated { note_id: Uuid, owner_id: Uuid },
    /// A note was deleted.
    NoteDeleted { note_id: Uuid, owner_id: Uuid },
    /// A note was shared with a recipient.
    NoteShared {
        note_id: Uuid,
        shared_with: String,
        permission: String,
    },
}

impl ServerEvent {
    /// Event type name, used for logging and dispatcher filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::UserRegistered { .. } => "UserRegistered",
            ServerEvent::NoteCreated { .. } => "NoteCreated",
            ServerEvent::NoteUpdated { .. } => "NoteUpdated",
            ServerEvent::NoteDeleted { .. } => "NoteDeleted",
            ServerEvent::NoteShared { .. } => "NoteShared",
        }
    }

    /// The primary entity ID this event relates to.
    pub fn entity_id(&self) -> Uuid {
        match self {
            ServerEvent::UserRegistered { user_id, .. } => *user_id,
            ServerEvent::NoteCreated { note_id, .. }
            | ServerEvent::NoteUpdated { note_id, .. }
            | ServerEvent::NoteDeleted { note_id, .. }
            | ServerEvent::NoteShared { note_id, .. } => *note_id,
        }
    }
}

/// Broadcast-based event bus for distributing server events to multiple
/// consumers.
///
/// Uses `tokio::sync::broadcast` with a configurable buffer size. Slow
/// receivers that fall behind will receive a `Lagged` error and miss events;
/// freshness matters more than completeness for these streams.
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. If there are no active subscribers,
    /// the event is silently dropped.
    pub fn emit(&self, event: ServerEvent) {
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = event.event_type(),
            entity_id = %event.entity_id(),
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events. Each subscriber gets its own independent
    /// stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
