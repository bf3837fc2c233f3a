//! Intent matching.
//!
//! Rules are tried in registration order and the first full-string match wins.
//! The built-in table ends with a catch-all `fallback` rule, so every
//! utterance resolves to exactly one intent.

pub mod builtin;
pub mod matcher;
pub mod picker;
pub mod rule;

pub use builtin::{builtin_rules, FALLBACK_INTENT};
pub use matcher::{IntentMatch, IntentMatcher};
pub use picker::{FixedPicker, RandomPicker, ResponsePicker, SequencePicker};
pub use rule::ReplyRule;
