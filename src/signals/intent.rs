// src/signals/intent.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    TechnicalSupport,
    Billing,
    FeatureQuestion,
    Sales,
    Feedback,
    AccountManagement,
    General,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::TechnicalSupport => "technical_support",
            IntentLabel::Billing => "billing",
            IntentLabel::FeatureQuestion => "feature_question",
            IntentLabel::Sales => "sales",
            IntentLabel::Feedback => "feedback",
            IntentLabel::AccountManagement => "account_management",
            IntentLabel::General => "general",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IntentLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "technical_support" => IntentLabel::TechnicalSupport,
            "billing" => IntentLabel::Billing,
            "feature_question" => IntentLabel::FeatureQuestion,
            "sales" => IntentLabel::Sales,
            "feedback" => IntentLabel::Feedback,
            "account_management" => IntentLabel::AccountManagement,
            _ => IntentLabel::General,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub label: IntentLabel,
    pub priority: IntentPriority,
    pub confidence: f32,
}

/// One routing category: label, its static priority, and trigger keywords.
pub struct IntentSpec {
    pub label: IntentLabel,
    pub priority: IntentPriority,
    pub keywords: &'static [&'static str],
}

/// The routing table. Declaration order is the tie-break: on equal keyword
/// counts the earlier entry wins.
pub const INTENTS: &[IntentSpec] = &[
    IntentSpec {
        label: IntentLabel::TechnicalSupport,
        priority: IntentPriority::High,
        keywords: &[
            "error",
            "bug",
            "crash",
            "broken",
            "not working",
            "doesn't work",
            "failed",
            "failure",
            "exception",
            "timeout",
            "glitch",
            "502",
            "500",
        ],
    },
    IntentSpec {
        label: IntentLabel::Billing,
        priority: IntentPriority::High,
        keywords: &[
            "billing",
            "invoice",
            "charge",
            "charged",
            "refund",
            "payment",
            "subscription",
            "credit card",
            "overcharge",
            "receipt",
            "double billed",
        ],
    },
    IntentSpec {
        label: IntentLabel::FeatureQuestion,
        priority: IntentPriority::Medium,
        keywords: &[
            "how do i",
            "how to",
            "how can i",
            "can i",
            "is it possible",
            "feature",
            "support for",
            "where do i find",
        ],
    },
    IntentSpec {
        label: IntentLabel::Sales,
        priority: IntentPriority::Medium,
        keywords: &[
            "pricing",
            "price",
            "plan",
            "upgrade",
            "trial",
            "demo",
            "purchase",
            "enterprise",
            "quote",
        ],
    },
    IntentSpec {
        label: IntentLabel::Feedback,
        priority: IntentPriority::Low,
        keywords: &[
            "suggestion",
            "feedback",
            "would be nice",
            "improve",
            "wish",
            "idea",
            "feature request",
        ],
    },
    IntentSpec {
        label: IntentLabel::AccountManagement,
        priority: IntentPriority::Medium,
        keywords: &[
            "password",
            "reset",
            "login",
            "log in",
            "sign in",
            "account",
            "email address",
            "profile",
            "two-factor",
            "2fa",
            "delete my account",
        ],
    },
];

/// Look up the static priority for a label from the routing table.
pub fn static_priority(label: IntentLabel) -> IntentPriority {
    INTENTS
        .iter()
        .find(|spec| spec.label == label)
        .map(|spec| spec.priority)
        .unwrap_or(IntentPriority::Low)
}

/// Classify a message by keyword-hit count over the routing table.
/// Total: zero hits anywhere yields `general` at confidence 0.5.
pub fn classify(message: &str) -> Intent {
    let lowered = message.to_lowercase();

    let mut best: Option<(&IntentSpec, usize)> = None;
    for spec in INTENTS {
        let hits = spec.keywords.iter().filter(|kw| lowered.contains(*kw)).count();
        if hits == 0 {
            continue;
        }
        // strictly-greater keeps the first-declared winner on ties
        match best {
            Some((_, best_hits)) if hits <= best_hits => {}
            _ => best = Some((spec, hits)),
        }
    }

    match best {
        Some((spec, hits)) => Intent {
            label: spec.label,
            priority: spec.priority,
            confidence: (0.55 + 0.1 * hits as f32).min(0.95),
        },
        None => Intent {
            label: IntentLabel::General,
            priority: IntentPriority::Low,
            confidence: 0.5,
        },
    }
}
