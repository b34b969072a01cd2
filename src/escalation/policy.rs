// src/escalation/policy.rs

//! Ordered-rule escalation policy.
//!
//! Rules are not mutually exclusive; sentiment-first ordering is a business
//! decision, so evaluation order lives in one visible table (`RULES`) and
//! the first matching rule wins. `decide` is pure and total: every input
//! yields exactly one decision.

use tracing::debug;

use crate::conversation::types::{Message, MessageRole};
use crate::escalation::{EscalationDecision, EscalationReason, Priority};
use crate::signals::aggregate::ConversationSentiment;
use crate::signals::intent::{Intent, IntentLabel, IntentPriority};
use crate::signals::sentiment::SentimentLabel;

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Inclusive lower bound on aggregate negative confidence.
    pub negative_confidence_threshold: f32,
    /// Assistant turns after which an unresolved thread escalates.
    pub max_assistant_turns: usize,
    /// Intents that escalate when their static priority is high.
    pub high_priority_intents: Vec<IntentLabel>,
    /// Case-insensitive phrases that count as an explicit hand-off request.
    pub escalation_phrases: Vec<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            negative_confidence_threshold: 0.75,
            max_assistant_turns: 4,
            high_priority_intents: vec![IntentLabel::Billing, IntentLabel::TechnicalSupport],
            escalation_phrases: [
                "speak to a human",
                "talk to a human",
                "speak to someone",
                "talk to an agent",
                "human agent",
                "real person",
                "customer service",
                "representative",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Everything the policy looks at for one turn. The new user message is the
/// last user entry in `messages`.
pub struct PolicyInput<'a> {
    pub messages: &'a [Message],
    pub sentiment: &'a ConversationSentiment,
    pub intent: &'a Intent,
}

struct Rule {
    name: &'static str,
    check: fn(&EscalationPolicy, &PolicyInput<'_>) -> Option<EscalationDecision>,
}

/// Evaluation order. Reordering entries changes business behavior.
const RULES: &[Rule] = &[
    Rule {
        name: "negative_sentiment",
        check: EscalationPolicy::negative_sentiment,
    },
    Rule {
        name: "user_frustration",
        check: EscalationPolicy::user_frustration,
    },
    Rule {
        name: "unresolved_after_max_turns",
        check: EscalationPolicy::unresolved_after_max_turns,
    },
    Rule {
        name: "high_priority_intent",
        check: EscalationPolicy::high_priority_intent,
    },
    Rule {
        name: "explicit_user_request",
        check: EscalationPolicy::explicit_user_request,
    },
];

pub struct EscalationPolicy {
    config: EscalationConfig,
}

impl EscalationPolicy {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, input: &PolicyInput<'_>) -> EscalationDecision {
        for rule in RULES {
            if let Some(decision) = (rule.check)(self, input) {
                debug!(rule = rule.name, reason = ?decision.reason, "escalation rule fired");
                return decision;
            }
        }
        EscalationDecision::none()
    }

    fn negative_sentiment(&self, input: &PolicyInput<'_>) -> Option<EscalationDecision> {
        (input.sentiment.overall == SentimentLabel::Negative
            && input.sentiment.confidence >= self.config.negative_confidence_threshold)
            .then(|| EscalationDecision::escalate(EscalationReason::NegativeSentiment, Priority::High))
    }

    fn user_frustration(&self, input: &PolicyInput<'_>) -> Option<EscalationDecision> {
        input
            .sentiment
            .user_frustration_detected
            .then(|| EscalationDecision::escalate(EscalationReason::NegativeSentiment, Priority::High))
    }

    fn unresolved_after_max_turns(&self, input: &PolicyInput<'_>) -> Option<EscalationDecision> {
        let assistant_turns = input
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count();
        (assistant_turns >= self.config.max_assistant_turns)
            .then(|| EscalationDecision::escalate(EscalationReason::UnresolvedIssue, Priority::Medium))
    }

    fn high_priority_intent(&self, input: &PolicyInput<'_>) -> Option<EscalationDecision> {
        if !self.config.high_priority_intents.contains(&input.intent.label)
            || input.intent.priority != IntentPriority::High
        {
            return None;
        }
        let reason = match input.intent.label {
            IntentLabel::Billing => EscalationReason::BillingIssue,
            _ => EscalationReason::TechnicalError,
        };
        Some(EscalationDecision::escalate(reason, Priority::High))
    }

    fn explicit_user_request(&self, input: &PolicyInput<'_>) -> Option<EscalationDecision> {
        let last = input
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)?;
        let lowered = last.content.to_lowercase();
        self.config
            .escalation_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.to_lowercase().as_str()))
            .then(|| EscalationDecision::escalate(EscalationReason::UserRequest, Priority::Medium))
    }
}
