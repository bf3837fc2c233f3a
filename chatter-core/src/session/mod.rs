//! Session lifecycle: open, resolve, rate-limit, close.
//!
//! Provides per-session state with:
//! - Capacity-limited open
//! - Idle TTL with lazy expiry
//! - A rolling per-session utterance window
//! - Append-only history

pub mod store;
pub mod types;

pub use store::{lock_session, SessionHandle, SessionStore};
pub use types::{RateWindow, Session, SessionId, SessionSnapshot};
