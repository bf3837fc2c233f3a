//! Utterance submission: the public face of the responder.
//!
//! Ties the session store and the intent matcher together:
//!
//! ```text
//! send_utterance(id, text)
//!   ├─ length check                 → UtteranceTooLong
//!   ├─ resolve session              → SessionExpired / RealmMismatch
//!   ├─ rate check (current window)  → RateLimitExceeded (+ rate_limit.hit)
//!   ├─ record + "user: …"           (+ utterance.received)
//!   ├─ match intent, truncate reply
//!   └─ "static: …"                  (+ reply.emitted, intent.matched)
//! ```
//!
//! Everything after the session lookup runs under that session's lock, so the
//! entries of two concurrent submissions to one session never interleave.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chatter_common::config::Config;
use chatter_common::events::{Event, EventKind, EventSink};
use chatter_common::util::{char_len, truncate_chars, truncate_with_ellipsis};
use chatter_common::{Error, Result};
use serde_json::json;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::intent::{IntentMatch, IntentMatcher};
use crate::session::{lock_session, SessionId, SessionSnapshot, SessionStore};

/// History prefix for user utterances.
pub const USER_PREFIX: &str = "user: ";

/// History prefix for emitted replies.
pub const REPLY_PREFIX: &str = "static: ";

/// Characters of an utterance shown in log lines.
const LOG_PREVIEW_CHARS: usize = 48;

/// Rule-based conversational responder.
pub struct Responder {
    store: SessionStore,
    matcher: IntentMatcher,
    sink: Arc<dyn EventSink>,
    processed: AtomicU64,
    max_utterance_len: usize,
    max_reply_len: usize,
}

impl Responder {
    pub fn new(config: &Config, matcher: IntentMatcher, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store: SessionStore::new(config, sink.clone()),
            matcher,
            sink,
            processed: AtomicU64::new(0),
            max_utterance_len: config.limits.max_utterance_len,
            max_reply_len: config.limits.max_reply_len,
        }
    }

    /// Replace the time source used for TTL and rate windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.store = self.store.with_clock(clock);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub fn open_session(&self) -> Result<SessionId> {
        self.store.open_session()
    }

    /// Idempotent; unknown ids are ignored.
    pub fn close_session(&self, id: &SessionId) {
        self.store.close_session(id);
    }

    /// Submit one utterance and return the reply.
    pub fn send_utterance(&self, id: &SessionId, text: &str) -> Result<String> {
        let len = char_len(text);
        if len > self.max_utterance_len {
            return Err(Error::UtteranceTooLong {
                len,
                max: self.max_utterance_len,
            });
        }

        let handle = self.store.resolve_session(id)?;
        let mut session = lock_session(&handle)?;
        self.store.ensure_live(&session)?;

        if self.store.rate_exceeded(&session) {
            let limit = self.store.rate_limit();
            self.emit(
                EventKind::RateLimitHit,
                id,
                json!({ "limit": limit, "count": session.window().count() }),
            );
            warn!(session_id = %id, limit, "Rate limit exceeded");
            return Err(Error::RateLimitExceeded {
                session_id: id.to_string(),
                limit,
            });
        }

        self.store.record_utterance(&mut session);
        self.store
            .append_history(&mut session, format!("{USER_PREFIX}{text}"));
        self.emit(EventKind::UtteranceReceived, id, json!({ "len": len }));
        debug!(
            session_id = %id,
            preview = %truncate_with_ellipsis(text, LOG_PREVIEW_CHARS),
            "Utterance received"
        );

        let IntentMatch {
            intent_id,
            rule,
            response,
        } = self.matcher.match_intent(text)?;

        let reply = truncate_chars(response, self.max_reply_len);
        let truncated = reply.len() < response.len();

        self.store
            .append_history(&mut session, format!("{REPLY_PREFIX}{reply}"));
        drop(session);

        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(
            EventKind::ReplyEmitted,
            id,
            json!({ "len": char_len(&reply), "truncated": truncated }),
        );
        self.emit(
            EventKind::IntentMatched,
            id,
            json!({ "intent_id": intent_id, "priority": rule.priority() }),
        );
        debug!(session_id = %id, intent_id, processed, "Reply emitted");

        Ok(reply)
    }

    /// Match without touching any session.
    pub fn match_intent(&self, text: &str) -> Result<IntentMatch<'_>> {
        self.matcher.match_intent(text)
    }

    /// Distinct intent ids in first-registration order.
    pub fn list_intents(&self) -> Vec<&str> {
        self.matcher.list_intents()
    }

    pub fn history(&self, id: &SessionId) -> Result<Vec<String>> {
        self.store.history(id)
    }

    pub fn snapshot(&self, id: &SessionId) -> Result<SessionSnapshot> {
        self.store.snapshot(id)
    }

    /// Utterances answered since start, across all sessions.
    pub fn processed_utterances(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    fn emit(&self, kind: EventKind, id: &SessionId, payload: serde_json::Value) {
        self.sink.record(
            Event::new(kind, self.store.realm_id(), id.as_str()).with_payload(payload),
        );
    }
}
