// src/escalation/mod.rs

pub mod policy;

pub use policy::{EscalationConfig, EscalationPolicy, PolicyInput};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    NegativeSentiment,
    UnresolvedIssue,
    BillingIssue,
    TechnicalError,
    UserRequest,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::NegativeSentiment => "negative_sentiment",
            EscalationReason::UnresolvedIssue => "unresolved_issue",
            EscalationReason::BillingIssue => "billing_issue",
            EscalationReason::TechnicalError => "technical_error",
            EscalationReason::UserRequest => "user_request",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EscalationReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "negative_sentiment" => Ok(EscalationReason::NegativeSentiment),
            "unresolved_issue" => Ok(EscalationReason::UnresolvedIssue),
            "billing_issue" => Ok(EscalationReason::BillingIssue),
            "technical_error" => Ok(EscalationReason::TechnicalError),
            "user_request" => Ok(EscalationReason::UserRequest),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            _ => Priority::Low,
        })
    }
}

/// The outcome of the escalation policy for one turn. `escalated=true`
/// always carries a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub should_escalate: bool,
    pub reason: Option<EscalationReason>,
    pub priority: Priority,
}

impl EscalationDecision {
    pub fn escalate(reason: EscalationReason, priority: Priority) -> Self {
        Self {
            should_escalate: true,
            reason: Some(reason),
            priority,
        }
    }

    pub fn none() -> Self {
        Self {
            should_escalate: false,
            reason: None,
            priority: Priority::Low,
        }
    }
}
