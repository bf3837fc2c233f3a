//! Session types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Opaque session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Fixed-length counting window that resets wholesale once it has elapsed.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    start: Instant,
    count: u32,
}

impl RateWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            start: now,
            count: 0,
        }
    }

    fn lapsed(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.start) >= window
    }

    /// Count as seen at `now`: zero once the window has lapsed.
    pub fn current_count(&self, now: Instant, window: Duration) -> u32 {
        if self.lapsed(now, window) {
            0
        } else {
            self.count
        }
    }

    /// Whether recording one more utterance at `now` would go past `limit`.
    pub fn would_exceed(&self, now: Instant, window: Duration, limit: u32) -> bool {
        self.current_count(now, window).saturating_add(1) > limit
    }

    /// Count one utterance, restarting the window first if it has lapsed.
    pub fn record(&mut self, now: Instant, window: Duration) {
        if self.lapsed(now, window) {
            self.start = now;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Raw count, without lapse adjustment.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// One ongoing conversation.
///
/// `history` is append-only: one entry per accepted utterance and one per reply.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    realm_id: String,
    opened_at: Instant,
    last_utterance_at: Instant,
    window: RateWindow,
    history: Vec<String>,
    context: HashMap<String, serde_json::Value>,
    closed: bool,
}

impl Session {
    pub fn new(id: SessionId, realm_id: impl Into<String>, now: Instant) -> Self {
        Self {
            id,
            realm_id: realm_id.into(),
            opened_at: now,
            last_utterance_at: now,
            window: RateWindow::new(now),
            history: Vec::new(),
            context: HashMap::new(),
            closed: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn last_utterance_at(&self) -> Instant {
        self.last_utterance_at
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn context(&self) -> &HashMap<String, serde_json::Value> {
        &self.context
    }

    /// Set a context value, returning the previous one.
    pub fn set_context(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.context.insert(key.into(), value)
    }

    /// Idle time since the last accepted utterance (or since open).
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_utterance_at)
    }

    /// Expired once idle time strictly exceeds `ttl`.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.idle(now) > ttl
    }

    /// Closed sessions stay closed even if a caller still holds a handle.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub(crate) fn record_utterance(&mut self, now: Instant, window: Duration) {
        self.window.record(now, window);
        self.last_utterance_at = now;
    }

    pub(crate) fn append_history(&mut self, entry: String) {
        self.history.push(entry);
    }

    pub fn snapshot(&self, now: Instant, window: Duration) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            realm_id: self.realm_id.clone(),
            history: self.history.clone(),
            context: self.context.clone(),
            utterances_in_window: self.window.current_count(now, window),
            idle_ms: u64::try_from(self.idle(now).as_millis()).unwrap_or(u64::MAX),
            age_ms: u64::try_from(now.saturating_duration_since(self.opened_at).as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Serializable point-in-time view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub realm_id: String,
    pub history: Vec<String>,
    pub context: HashMap<String, serde_json::Value>,
    pub utterances_in_window: u32,
    pub idle_ms: u64,
    pub age_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_session_id_generate_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_rate_window_allows_exactly_limit() {
        let t0 = Instant::now();
        let mut window = RateWindow::new(t0);
        for _ in 0..3 {
            assert!(!window.would_exceed(t0, WINDOW, 3));
            window.record(t0, WINDOW);
        }
        assert!(window.would_exceed(t0, WINDOW, 3));
        assert_eq!(window.count(), 3);
    }

    #[test]
    fn test_rate_window_resets_after_lapse() {
        let t0 = Instant::now();
        let mut window = RateWindow::new(t0);
        window.record(t0, WINDOW);
        window.record(t0, WINDOW);

        let later = t0 + WINDOW;
        assert_eq!(window.current_count(later, WINDOW), 0);
        assert!(!window.would_exceed(later, WINDOW, 2));

        window.record(later, WINDOW);
        assert_eq!(window.count(), 1);
        assert_eq!(window.start(), later);
    }

    #[test]
    fn test_session_expiry_is_strict() {
        let t0 = Instant::now();
        let session = Session::new(SessionId::from("s"), "0x1", t0);
        let ttl = Duration::from_millis(1000);
        assert!(!session.is_expired(t0 + ttl, ttl));
        assert!(session.is_expired(t0 + ttl + Duration::from_millis(1), ttl));
    }

    #[test]
    fn test_record_utterance_refreshes_idle() {
        let t0 = Instant::now();
        let mut session = Session::new(SessionId::from("s"), "0x1", t0);
        let t1 = t0 + Duration::from_secs(30);
        session.record_utterance(t1, WINDOW);
        assert_eq!(session.last_utterance_at(), t1);
        assert_eq!(session.idle(t1), Duration::ZERO);
        assert_eq!(session.window().count(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let t0 = Instant::now();
        let mut session = Session::new(SessionId::from("abc"), "0x1", t0);
        session.append_history("user: hi".into());
        session.set_context("lang", serde_json::json!("en"));

        let snap = session.snapshot(t0 + Duration::from_millis(250), WINDOW);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["history"][0], "user: hi");
        assert_eq!(json["context"]["lang"], "en");
        assert_eq!(json["idle_ms"], 250);
    }
}
