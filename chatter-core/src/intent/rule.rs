//! Reply rules.

use chatter_common::{Error, Result};
use regex::{Regex, RegexBuilder};

/// One intent: a pattern and the canned responses it can produce.
///
/// Patterns match the whole (trimmed) utterance and are case-insensitive
/// unless built with [`ReplyRule::case_sensitive`].
#[derive(Debug, Clone)]
pub struct ReplyRule {
    intent_id: String,
    pattern: String,
    regex: Regex,
    responses: Vec<String>,
    /// Carried for callers; matching order is registration order.
    priority: i32,
    case_sensitive: bool,
}

impl ReplyRule {
    /// Build a case-insensitive rule.
    pub fn new<I, S>(
        intent_id: impl Into<String>,
        pattern: &str,
        responses: I,
        priority: i32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(intent_id.into(), pattern, responses, priority, false)
    }

    /// Build a rule whose pattern is matched case-sensitively.
    pub fn case_sensitive<I, S>(
        intent_id: impl Into<String>,
        pattern: &str,
        responses: I,
        priority: i32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(intent_id.into(), pattern, responses, priority, true)
    }

    fn build<I, S>(
        intent_id: String,
        pattern: &str,
        responses: I,
        priority: i32,
        case_sensitive: bool,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if intent_id.is_empty() {
            return Err(Error::InvalidRule {
                intent_id,
                reason: "intent id is empty".into(),
            });
        }

        let responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        if responses.is_empty() {
            return Err(Error::InvalidRule {
                intent_id,
                reason: "no responses".into(),
            });
        }

        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| Error::InvalidRule {
                intent_id: intent_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            intent_id,
            pattern: pattern.to_string(),
            regex,
            responses,
            priority,
            case_sensitive,
        })
    }

    /// Full-string match against already-normalized text.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn intent_id(&self) -> &str {
        &self.intent_id
    }

    /// Pattern as registered, without the anchoring wrapper.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}
