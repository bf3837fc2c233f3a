//! Built-in rule table.
//!
//! Order matters: the first matching rule wins, so specific intents come
//! first and `fallback` comes last.

use chatter_common::Result;

use super::rule::ReplyRule;

/// Intent id of the catch-all rule.
pub const FALLBACK_INTENT: &str = "fallback";

struct RuleDef {
    intent_id: &'static str,
    pattern: &'static str,
    responses: &'static [&'static str],
    priority: i32,
}

const BUILTIN: &[RuleDef] = &[
    RuleDef {
        intent_id: "greeting_hi",
        pattern: r"(hi|hello|hey|hiya|howdy|greetings|good (morning|afternoon|evening))( there)?[!.]*",
        responses: &["Hello!", "Hi there!", "Hey! How can I help?"],
        priority: 10,
    },
    RuleDef {
        intent_id: "greeting_bye",
        pattern: r"(bye|goodbye|bye bye|see (you|ya)( later| soon)?|farewell|good night)[!.]*",
        responses: &["Goodbye!", "See you later!", "Take care!"],
        priority: 10,
    },
    RuleDef {
        intent_id: "thanks",
        pattern: r"(thanks|thank you|thx|ty|cheers)( (so|very) much)?[!.]*",
        responses: &["You're welcome!", "Any time.", "Glad to help."],
        priority: 8,
    },
    RuleDef {
        intent_id: "how_are_you",
        pattern: r"how are (you|u)( doing| today)?[?!.]*",
        responses: &["I'm doing well, thanks for asking.", "All systems nominal."],
        priority: 6,
    },
    RuleDef {
        intent_id: "ask_name",
        pattern: r"(what('s| is) your name|who are (you|u))[?!.]*",
        responses: &["I'm Static, a rule-based responder.", "They call me Static."],
        priority: 6,
    },
    RuleDef {
        intent_id: "help",
        pattern: r"(help( me)?|what can you do|commands)[?!.]*|\?+",
        responses: &[
            "I can chat about simple things: say hello, ask my name, or say goodbye.",
            "Try greeting me, thanking me, or asking how I am.",
        ],
        priority: 5,
    },
    RuleDef {
        intent_id: "affirm",
        pattern: r"(yes|yeah|yep|sure|ok|okay|of course)[!.]*",
        responses: &["Great.", "Okay!", "Understood."],
        priority: 3,
    },
    RuleDef {
        intent_id: "deny",
        pattern: r"(no|nope|nah|no thanks)[!.]*",
        responses: &["Alright.", "No problem.", "Okay, never mind."],
        priority: 3,
    },
    RuleDef {
        intent_id: FALLBACK_INTENT,
        pattern: r"(?s).*",
        responses: &[
            "I'm not sure I follow.",
            "Could you rephrase that?",
            "Interesting. Tell me more.",
        ],
        priority: 0,
    },
];

/// Compile the built-in rules in registration order.
pub fn builtin_rules() -> Result<Vec<ReplyRule>> {
    BUILTIN
        .iter()
        .map(|def| {
            ReplyRule::new(
                def.intent_id,
                def.pattern,
                def.responses.iter().copied(),
                def.priority,
            )
        })
        .collect()
}
