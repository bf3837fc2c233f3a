//! Error types for the Chatter responder.

use thiserror::Error;

/// Result type alias using the Chatter error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for session and intent operations.
///
/// None of these are retried internally; retry is the caller's policy.
#[derive(Error, Debug)]
pub enum Error {
    /// The realm already holds the maximum number of live sessions.
    #[error("Session cap reached: realm holds {max} live sessions")]
    SessionCapReached { max: usize },

    /// Unknown, closed or TTL-lapsed session id.
    #[error("Session expired or unknown: {0}")]
    SessionExpired(String),

    /// The store was configured with a realm other than the static one.
    #[error("Realm mismatch: expected {expected}, configured {actual}")]
    RealmMismatch { expected: String, actual: String },

    /// Utterance longer than the accepted maximum.
    #[error("Utterance too long: {len} characters (max {max})")]
    UtteranceTooLong { len: usize, max: usize },

    /// Per-session utterance rate exceeded for the current window.
    #[error("Rate limit exceeded for session {session_id}: {limit} utterances per window")]
    RateLimitExceeded { session_id: String, limit: u32 },

    /// No rule matched; the fallback rule is missing from the rule set.
    #[error("No intent matched: {0}")]
    IntentUnknown(String),

    /// A reply rule could not be built.
    #[error("Invalid rule {intent_id}: {reason}")]
    InvalidRule { intent_id: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Configuration or registration invariant violations. Not user-recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            Self::RealmMismatch { .. } | Self::IntentUnknown(_)
        )
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.root(), Self::RateLimitExceeded { .. })
    }

    /// Check if the caller has to open a new session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self.root(), Self::SessionExpired(_))
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
