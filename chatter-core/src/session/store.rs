//! In-memory session store.
//!
//! Sessions live in a `DashMap` keyed by id, each behind its own mutex, so
//! independent sessions never contend on a shared lock. Capacity is reserved
//! through an atomic counter before a session is inserted.
//!
//! Expiry is lazy: an idle session stays in the map until it is looked up,
//! purged, or closed, but is never handed out once its TTL has lapsed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chatter_common::config::{Config, STATIC_REALM_ID};
use chatter_common::events::{Event, EventKind, EventSink};
use chatter_common::{Error, Result};
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, info, warn};

use super::types::{Session, SessionId, SessionSnapshot};
use crate::clock::{Clock, SystemClock};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Lock a session, mapping a poisoned lock to an internal error.
pub fn lock_session(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>> {
    handle
        .lock()
        .map_err(|e| Error::Internal(format!("session lock poisoned: {e}")))
}

/// Owner of every live session in the realm.
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
    /// Sessions currently in the map, including expired-but-unremoved ones
    live: AtomicUsize,
    realm_id: String,
    max_sessions: usize,
    ttl: Duration,
    rate_window: Duration,
    rate_limit: u32,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl SessionStore {
    /// Create a store bound to the configured realm and limits.
    pub fn new(config: &Config, sink: Arc<dyn EventSink>) -> Self {
        Self {
            sessions: DashMap::new(),
            live: AtomicUsize::new(0),
            realm_id: config.realm.realm_id.clone(),
            max_sessions: config.limits.max_sessions,
            ttl: Duration::from_millis(config.limits.session_ttl_ms),
            rate_window: Duration::from_millis(config.limits.rate_window_ms),
            rate_limit: config.limits.rate_limit_per_min,
            clock: Arc::new(SystemClock),
            sink,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    /// Number of sessions held, counting expired ones not yet removed.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn reserve_slot(&self) -> bool {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_sessions).then_some(n + 1)
            })
            .is_ok()
    }

    /// Open a new session bound to the realm.
    pub fn open_session(&self) -> Result<SessionId> {
        // A full store may still hold lapsed sessions; sweep once before refusing.
        if !self.reserve_slot() && (self.purge_expired() == 0 || !self.reserve_slot()) {
            warn!(
                realm_id = %self.realm_id,
                max_sessions = self.max_sessions,
                "Session cap reached"
            );
            return Err(Error::SessionCapReached {
                max: self.max_sessions,
            });
        }

        let id = SessionId::generate();
        let session = Session::new(id.clone(), self.realm_id.clone(), self.clock.now());
        self.sessions
            .insert(id.clone(), Arc::new(Mutex::new(session)));

        let live = self.live_count();
        self.sink.record(
            Event::new(EventKind::SessionOpened, &self.realm_id, id.as_str())
                .with_payload(json!({ "live_sessions": live })),
        );
        info!(session_id = %id, live_sessions = live, "Session opened");

        Ok(id)
    }

    /// Look up a live session.
    ///
    /// Never refreshes the TTL; only an accepted utterance does.
    pub fn resolve_session(&self, id: &SessionId) -> Result<SessionHandle> {
        if self.realm_id != STATIC_REALM_ID {
            return Err(Error::RealmMismatch {
                expected: STATIC_REALM_ID.to_string(),
                actual: self.realm_id.clone(),
            });
        }

        let handle = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::SessionExpired(id.to_string()))?;

        let expired = {
            let session = lock_session(&handle)?;
            session.is_closed() || session.is_expired(self.clock.now(), self.ttl)
        };
        if expired {
            self.remove_if_expired(id);
            return Err(Error::SessionExpired(id.to_string()));
        }

        Ok(handle)
    }

    /// Fail if a locked session was closed or lapsed after it was resolved.
    pub fn ensure_live(&self, session: &Session) -> Result<()> {
        if session.is_closed() || session.is_expired(self.clock.now(), self.ttl) {
            return Err(Error::SessionExpired(session.id().to_string()));
        }
        Ok(())
    }

    /// Whether one more utterance in the current window would exceed the limit.
    pub fn rate_exceeded(&self, session: &Session) -> bool {
        session
            .window()
            .would_exceed(self.clock.now(), self.rate_window, self.rate_limit)
    }

    /// Advance the rate window and refresh the idle timer.
    pub fn record_utterance(&self, session: &mut Session) {
        session.record_utterance(self.clock.now(), self.rate_window);
    }

    /// Append one history entry.
    pub fn append_history(&self, session: &mut Session, entry: impl Into<String>) {
        session.append_history(entry.into());
    }

    /// Remove a session. Unknown ids are a no-op.
    pub fn close_session(&self, id: &SessionId) {
        let Some((_, handle)) = self.sessions.remove(id) else {
            debug!(session_id = %id, "Close of unknown session ignored");
            return;
        };
        self.live.fetch_sub(1, Ordering::SeqCst);

        if let Ok(mut session) = handle.lock() {
            session.mark_closed();
        }

        self.sink
            .record(Event::new(EventKind::SessionClosed, &self.realm_id, id.as_str()));
        info!(session_id = %id, "Session closed");
    }

    fn remove_if_expired(&self, id: &SessionId) {
        let now = self.clock.now();
        let ttl = self.ttl;
        let removed = self.sessions.remove_if(id, |_, handle| {
            lock_session(handle).map_or(true, |s| s.is_closed() || s.is_expired(now, ttl))
        });
        if removed.is_some() {
            self.live.fetch_sub(1, Ordering::SeqCst);
            debug!(session_id = %id, "Expired session removed");
        }
    }

    /// Remove every lapsed session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut removed = 0usize;

        self.sessions.retain(|_, handle| {
            let keep = lock_session(handle).map_or(false, |s| !s.is_expired(now, ttl));
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            self.live.fetch_sub(removed, Ordering::SeqCst);
            info!(removed, live_sessions = self.live_count(), "Purged expired sessions");
        }
        removed
    }

    /// Copy of a session's history.
    pub fn history(&self, id: &SessionId) -> Result<Vec<String>> {
        let handle = self.resolve_session(id)?;
        let session = lock_session(&handle)?;
        Ok(session.history().to_vec())
    }

    /// Point-in-time view of a session.
    pub fn snapshot(&self, id: &SessionId) -> Result<SessionSnapshot> {
        let handle = self.resolve_session(id)?;
        let session = lock_session(&handle)?;
        Ok(session.snapshot(self.clock.now(), self.rate_window))
    }

    /// Set a context value on a session, returning the previous one.
    pub fn set_context(
        &self,
        id: &SessionId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<Option<serde_json::Value>> {
        let handle = self.resolve_session(id)?;
        let mut session = lock_session(&handle)?;
        Ok(session.set_context(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chatter_common::events::InMemoryEventLog;

    fn store_with(config: Config) -> (SessionStore, Arc<InMemoryEventLog>, Arc<ManualClock>) {
        let log = Arc::new(InMemoryEventLog::new());
        let clock = Arc::new(ManualClock::new());
        let store = SessionStore::new(&config, log.clone()).with_clock(clock.clone());
        (store, log, clock)
    }

    fn small_config(max_sessions: usize) -> Config {
        let mut config = Config::default();
        config.limits.max_sessions = max_sessions;
        config
    }

    #[test]
    fn test_open_emits_event_and_counts() {
        let (store, log, _) = store_with(Config::default());
        let id = store.open_session().unwrap();

        assert_eq!(store.live_count(), 1);
        assert_eq!(log.count(EventKind::SessionOpened), 1);
        assert_eq!(log.events()[0].session_id, id.as_str());

        let handle = store.resolve_session(&id).unwrap();
        assert_eq!(lock_session(&handle).unwrap().realm_id(), STATIC_REALM_ID);
    }

    #[test]
    fn test_cap_reached() {
        let (store, _, _) = store_with(small_config(2));
        store.open_session().unwrap();
        store.open_session().unwrap();

        let err = store.open_session().unwrap_err();
        assert!(matches!(err, Error::SessionCapReached { max: 2 }));
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_close_frees_capacity() {
        let (store, _, _) = store_with(small_config(1));
        let id = store.open_session().unwrap();
        store.close_session(&id);
        assert!(store.open_session().is_ok());
    }

    #[test]
    fn test_full_store_purges_expired_before_refusing() {
        let (store, _, clock) = store_with(small_config(1));
        store.open_session().unwrap();

        clock.advance_ms(3_600_001);
        assert!(store.open_session().is_ok());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_resolve_unknown_is_expired() {
        let (store, _, _) = store_with(Config::default());
        let err = store.resolve_session(&SessionId::from("nope")).unwrap_err();
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_resolve_after_ttl_removes_record() {
        let (store, _, clock) = store_with(Config::default());
        let id = store.open_session().unwrap();

        clock.advance_ms(3_600_000);
        assert!(store.resolve_session(&id).is_ok());

        clock.advance_ms(1);
        assert!(store.resolve_session(&id).unwrap_err().is_session_expired());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_resolve_does_not_refresh_ttl() {
        let (store, _, clock) = store_with(Config::default());
        let id = store.open_session().unwrap();

        clock.advance_ms(3_000_000);
        store.resolve_session(&id).unwrap();
        clock.advance_ms(700_000);
        assert!(store.resolve_session(&id).is_err());
    }

    #[test]
    fn test_realm_mismatch() {
        let mut config = Config::default();
        config.realm.realm_id = "0xdeadbeef".to_string();
        let (store, _, _) = store_with(config);

        let id = store.open_session().unwrap();
        let err = store.resolve_session(&id).unwrap_err();
        assert!(matches!(err, Error::RealmMismatch { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (store, log, _) = store_with(Config::default());
        let id = store.open_session().unwrap();

        store.close_session(&id);
        store.close_session(&id);
        store.close_session(&SessionId::from("never-opened"));

        assert_eq!(log.count(EventKind::SessionClosed), 1);
        assert_eq!(store.live_count(), 0);
        assert!(store.resolve_session(&id).is_err());
    }

    #[test]
    fn test_closed_handle_is_rejected() {
        let (store, _, _) = store_with(Config::default());
        let id = store.open_session().unwrap();
        let handle = store.resolve_session(&id).unwrap();

        store.close_session(&id);

        let session = lock_session(&handle).unwrap();
        assert!(store.ensure_live(&session).unwrap_err().is_session_expired());
    }

    #[test]
    fn test_rate_window_through_store() {
        let mut config = Config::default();
        config.limits.rate_limit_per_min = 2;
        let (store, _, clock) = store_with(config);
        let id = store.open_session().unwrap();
        let handle = store.resolve_session(&id).unwrap();
        let mut session = lock_session(&handle).unwrap();

        assert!(!store.rate_exceeded(&session));
        store.record_utterance(&mut session);
        store.record_utterance(&mut session);
        assert!(store.rate_exceeded(&session));

        clock.advance_ms(60_000);
        assert!(!store.rate_exceeded(&session));
    }

    #[test]
    fn test_purge_expired_keeps_active() {
        let (store, _, clock) = store_with(Config::default());
        let stale = store.open_session().unwrap();
        clock.advance_ms(3_000_000);
        let fresh = store.open_session().unwrap();
        clock.advance_ms(700_000);

        assert_eq!(store.purge_expired(), 1);
        assert!(store.resolve_session(&stale).is_err());
        assert!(store.resolve_session(&fresh).is_ok());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_context_and_snapshot() {
        let (store, _, _) = store_with(Config::default());
        let id = store.open_session().unwrap();

        assert!(store
            .set_context(&id, "mood", serde_json::json!("curious"))
            .unwrap()
            .is_none());
        let snap = store.snapshot(&id).unwrap();
        assert_eq!(snap.context["mood"], "curious");
        assert!(snap.history.is_empty());
        assert_eq!(snap.realm_id, STATIC_REALM_ID);
    }
}
