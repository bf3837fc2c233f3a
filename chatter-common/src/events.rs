//! Event sink for responder observability.
//!
//! The core only ever appends events; it never reads them back. Sinks:
//!
//! - **InMemoryEventLog**: append-only log, used by tests and `chatter ask`
//! - **BroadcastSink**: fan-out over a tokio broadcast channel for async observers
//! - **NoopSink**: discards everything
//!
//! # Event Kinds
//!
//! | Kind | Name |
//! |------|------|
//! | `SessionOpened` | `session.opened` |
//! | `UtteranceReceived` | `utterance.received` |
//! | `ReplyEmitted` | `reply.emitted` |
//! | `SessionClosed` | `session.closed` |
//! | `IntentMatched` | `intent.matched` |
//! | `RateLimitHit` | `rate_limit.hit` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Event Types
// ============================================================================

/// The six observable event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionOpened,
    UtteranceReceived,
    ReplyEmitted,
    SessionClosed,
    IntentMatched,
    RateLimitHit,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 6] = [
        Self::SessionOpened,
        Self::UtteranceReceived,
        Self::ReplyEmitted,
        Self::SessionClosed,
        Self::IntentMatched,
        Self::RateLimitHit,
    ];

    /// Dotted event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionOpened => "session.opened",
            Self::UtteranceReceived => "utterance.received",
            Self::ReplyEmitted => "reply.emitted",
            Self::SessionClosed => "session.closed",
            Self::IntentMatched => "intent.matched",
            Self::RateLimitHit => "rate_limit.hit",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID.
    pub id: String,
    /// Event kind.
    pub kind: EventKind,
    /// Realm the session belongs to.
    pub realm_id: String,
    /// Session the event concerns.
    pub session_id: String,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// JSON payload.
    pub payload: serde_json::Value,
}

impl Event {
    /// Create a new event with auto-generated ID and timestamp.
    pub fn new(kind: EventKind, realm_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            realm_id: realm_id.into(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            payload: serde_json::Value::Null,
        }
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ============================================================================
// Event Sink Trait
// ============================================================================

/// Append-only sink the responder reports events to.
pub trait EventSink: Send + Sync {
    /// Record one event. Must not fail or block for long.
    fn record(&self, event: Event);
}

// ============================================================================
// In-Memory Log
// ============================================================================

/// Append-only in-memory event log.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<Event>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, in recording order.
    pub fn events(&self) -> Vec<Event> {
        self.guard().clone()
    }

    /// Number of recorded events of `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.guard().iter().filter(|e| e.kind == kind).count()
    }

    /// Kinds of every recorded event, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.guard().iter().map(|e| e.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    // A panic while holding the lock cannot leave a half-pushed Vec behind,
    // so a poisoned log is still usable.
    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EventSink for InMemoryEventLog {
    fn record(&self, event: Event) {
        self.guard().push(event);
    }
}

// ============================================================================
// Broadcast Sink
// ============================================================================

/// Event sink backed by a tokio broadcast channel.
///
/// Publishing is synchronous; subscribers receive asynchronously. Slow
/// subscribers lag and lose the oldest events rather than blocking the core.
pub struct BroadcastSink {
    sender: broadcast::Sender<Event>,
}

impl BroadcastSink {
    /// Create a new sink with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new sink with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to every event recorded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastSink {
    fn record(&self, event: Event) {
        tracing::debug!(
            kind = %event.kind,
            session_id = %event.session_id,
            id = %event.id,
            "Event published"
        );

        // No receivers is not an error
        let _ = self.sender.send(event);
    }
}

// ============================================================================
// No-op Sink
// ============================================================================

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STATIC_REALM_ID;

    fn event(kind: EventKind) -> Event {
        Event::new(kind, STATIC_REALM_ID, "session-1")
    }

    #[test]
    fn test_event_kind_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "session.opened",
                "utterance.received",
                "reply.emitted",
                "session.closed",
                "intent.matched",
                "rate_limit.hit",
            ]
        );
    }

    #[test]
    fn test_event_serializes_kind_snake_case() {
        let e = event(EventKind::RateLimitHit).with_payload(serde_json::json!({ "limit": 60 }));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "rate_limit_hit");
        assert_eq!(json["payload"]["limit"], 60);
        assert_eq!(json["realm_id"], STATIC_REALM_ID);
    }

    #[test]
    fn test_in_memory_log_appends_in_order() {
        let log = InMemoryEventLog::new();
        assert!(log.is_empty());

        log.record(event(EventKind::SessionOpened));
        log.record(event(EventKind::UtteranceReceived));
        log.record(event(EventKind::SessionClosed));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(EventKind::SessionOpened), 1);
        assert_eq!(
            log.kinds(),
            vec![
                EventKind::SessionOpened,
                EventKind::UtteranceReceived,
                EventKind::SessionClosed
            ]
        );
    }

    #[test]
    fn test_in_memory_log_concurrent_appends() {
        let log = std::sync::Arc::new(InMemoryEventLog::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        log.record(event(EventKind::ReplyEmitted));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.count(EventKind::ReplyEmitted), 800);
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let sink = BroadcastSink::new();
        assert_eq!(sink.subscriber_count(), 0);
        sink.record(event(EventKind::SessionOpened));
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscribers() {
        let sink = BroadcastSink::with_capacity(8);
        let mut rx = sink.subscribe();

        sink.record(event(EventKind::IntentMatched));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, EventKind::IntentMatched);
        assert_eq!(received.session_id, "session-1");
    }
}
