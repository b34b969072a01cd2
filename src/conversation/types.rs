// src/conversation/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::escalation::{EscalationReason, Priority};
use crate::knowledge::types::Citation;
use crate::signals::aggregate::ConversationSentiment;
use crate::signals::intent::Intent;
use crate::signals::sentiment::Sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One entry in a conversation's append-only log. Content is never mutated
/// after append; sentiment/intent are set on user messages, sources on
/// assistant messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Citation>>,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
            timestamp: Utc::now(),
            sentiment: None,
            intent: None,
            sources: None,
        }
    }

    pub fn assistant(content: String, sources: Option<Vec<Citation>>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            timestamp: Utc::now(),
            sentiment: None,
            intent: None,
            sources,
        }
    }
}

/// Lifecycle: Active on creation, Assigned on explicit agent assignment,
/// Resolved on explicit resolution (directly from Active is valid). A new
/// turn on a Resolved conversation reopens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Assigned,
    Resolved,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Assigned => "assigned",
            ConversationStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Parse status defensively for DB interop; unknown values read as Active.
impl FromStr for ConversationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "assigned" => ConversationStatus::Assigned,
            "resolved" => ConversationStatus::Resolved,
            _ => ConversationStatus::Active,
        })
    }
}

/// A persisted support thread: the message log plus the latest derived
/// signals and the escalation/assignment/resolution state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub user_id: String,
    pub user_email: String,
    pub messages: Vec<Message>,
    pub sentiment: Option<ConversationSentiment>,
    pub intent: Option<Intent>,
    pub priority: Priority,
    pub escalated: bool,
    pub escalation_reason: Option<EscalationReason>,
    pub status: ConversationStatus,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
}

impl Conversation {
    pub fn new(user_id: String, user_email: String) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), user_id, user_email)
    }

    pub fn with_id(conversation_id: String, user_id: String, user_email: String) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            user_id,
            user_email,
            messages: Vec::new(),
            sentiment: None,
            intent: None,
            priority: Priority::Low,
            escalated: false,
            escalation_reason: None,
            status: ConversationStatus::Active,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            last_message_at: now,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
        }
    }

    pub fn assistant_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count()
    }

    pub fn latest_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::User)
    }

    /// A new turn arriving on a Resolved conversation brings it back to
    /// Active and clears the previous resolution.
    pub fn reopen(&mut self) {
        if self.status == ConversationStatus::Resolved {
            self.status = ConversationStatus::Active;
            self.resolved_at = None;
            self.resolved_by = None;
            self.resolution_notes = None;
        }
    }
}

/// Read-only row exposed to analytics and reporting observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub user_id: String,
    pub sentiment: Option<String>,
    pub intent: Option<String>,
    pub priority: Priority,
    pub escalated: bool,
    pub status: ConversationStatus,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
