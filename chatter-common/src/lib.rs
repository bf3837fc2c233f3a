//! Chatter Common - Shared types, utilities, and configuration for the Chatter responder.
//!
//! This crate provides:
//! - Fixed realm/node constants and configuration loading
//! - Configuration validation
//! - The unified error type
//! - Logging setup
//! - The append-only event sink and its implementations
//! - String utilities (character-safe truncation)

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    Config, LimitsConfig, ObservabilityConfig, RealmConfig, MAX_REPLY_LEN,
    MAX_SESSIONS_PER_REALM, MAX_UTTERANCE_LEN, RATE_LIMIT_UTTERANCES_PER_MIN, RATE_WINDOW_MS,
    SESSION_TTL_MS, STATIC_NODE_ADDRESSES, STATIC_REALM_ID,
};
pub use error::{Error, Result};
pub use events::{BroadcastSink, Event, EventKind, EventSink, InMemoryEventLog, NoopSink};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, LimitsConfig, STATIC_REALM_ID};
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::events::{Event, EventKind, EventSink};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
