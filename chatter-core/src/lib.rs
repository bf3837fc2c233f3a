//! Chatter Core - session lifecycle and intent matching for a rule-based responder.
//!
//! A caller opens a session, submits utterances to it and gets back one canned
//! reply per utterance:
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatter_common::{Config, InMemoryEventLog};
//! use chatter_core::{IntentMatcher, RandomPicker, Responder};
//!
//! let matcher = IntentMatcher::with_builtin_rules(Arc::new(RandomPicker))?;
//! let responder = Responder::new(&Config::default(), matcher, Arc::new(InMemoryEventLog::new()));
//!
//! let id = responder.open_session()?;
//! let reply = responder.send_utterance(&id, "hello")?;
//! println!("{reply}");
//! responder.close_session(&id);
//! # Ok::<(), chatter_common::Error>(())
//! ```

#![warn(clippy::all)]

pub mod clock;
pub mod intent;
pub mod responder;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use intent::{
    builtin_rules, FixedPicker, IntentMatch, IntentMatcher, RandomPicker, ReplyRule,
    ResponsePicker, SequencePicker, FALLBACK_INTENT,
};
pub use responder::{Responder, REPLY_PREFIX, USER_PREFIX};
pub use session::{Session, SessionId, SessionSnapshot, SessionStore};
