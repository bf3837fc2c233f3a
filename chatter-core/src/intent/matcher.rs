//! Ordered, first-match-wins intent matching.

use std::collections::HashSet;
use std::sync::Arc;

use chatter_common::{Error, Result};
use tracing::{debug, warn};

use super::builtin::{builtin_rules, FALLBACK_INTENT};
use super::picker::ResponsePicker;
use super::rule::ReplyRule;

/// Result of matching one utterance.
#[derive(Debug, Clone, Copy)]
pub struct IntentMatch<'a> {
    pub intent_id: &'a str,
    pub rule: &'a ReplyRule,
    pub response: &'a str,
}

/// Holds the rule list in registration order and resolves utterances against it.
///
/// Rules are evaluated strictly in the order they were registered; `priority`
/// is not consulted. The first rule whose pattern matches the trimmed
/// utterance wins.
pub struct IntentMatcher {
    rules: Vec<ReplyRule>,
    picker: Arc<dyn ResponsePicker>,
}

impl IntentMatcher {
    /// Create a matcher over `rules`, in the given order.
    pub fn new(rules: Vec<ReplyRule>, picker: Arc<dyn ResponsePicker>) -> Self {
        let matcher = Self { rules, picker };
        if !matcher.has_fallback() {
            warn!(
                rules = matcher.rules.len(),
                "Rule set does not end with a fallback rule; unmatched input will fail"
            );
        }
        matcher
    }

    /// Create a matcher over the built-in rule table.
    pub fn with_builtin_rules(picker: Arc<dyn ResponsePicker>) -> Result<Self> {
        Ok(Self::new(builtin_rules()?, picker))
    }

    /// Resolve `utterance` to exactly one rule and one of its responses.
    pub fn match_intent(&self, utterance: &str) -> Result<IntentMatch<'_>> {
        let normalized = utterance.trim();

        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(normalized))
            .ok_or_else(|| Error::IntentUnknown(normalized.to_string()))?;

        let responses = rule.responses();
        let index = self.picker.pick(responses.len());
        let response = responses.get(index).unwrap_or(&responses[0]);

        debug!(
            intent_id = %rule.intent_id(),
            priority = rule.priority(),
            response_index = index,
            "Intent matched"
        );

        Ok(IntentMatch {
            intent_id: rule.intent_id(),
            rule,
            response,
        })
    }

    /// Distinct intent ids in first-registration order.
    pub fn list_intents(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(ReplyRule::intent_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    /// Whether the last registered rule is the catch-all.
    pub fn has_fallback(&self) -> bool {
        self.rules
            .last()
            .is_some_and(|rule| rule.intent_id() == FALLBACK_INTENT)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
