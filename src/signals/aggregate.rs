// src/signals/aggregate.rs

use serde::{Deserialize, Serialize};

use crate::conversation::types::{Message, MessageRole};
use crate::signals::sentiment::SentimentLabel;

/// How many trailing user messages feed the aggregate.
const AGGREGATE_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTrajectory {
    Improving,
    Stable,
    Declining,
}

/// Conversation-level sentiment derived from recent user messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSentiment {
    pub overall: SentimentLabel,
    /// Fraction of windowed messages agreeing with the majority label.
    pub confidence: f32,
    pub trajectory: SentimentTrajectory,
    pub user_frustration_detected: bool,
}

impl ConversationSentiment {
    pub fn neutral() -> Self {
        Self {
            overall: SentimentLabel::Neutral,
            confidence: 0.5,
            trajectory: SentimentTrajectory::Stable,
            user_frustration_detected: false,
        }
    }
}

fn label_score(label: SentimentLabel) -> i8 {
    match label {
        SentimentLabel::Positive => 1,
        SentimentLabel::Neutral | SentimentLabel::Mixed => 0,
        SentimentLabel::Negative => -1,
    }
}

/// Majority label over the last few user messages, with the agreeing
/// fraction as confidence. Frustration fires when two consecutive user
/// messages in the window are both negative. Messages without a stored
/// sentiment are skipped.
pub fn aggregate(messages: &[Message]) -> ConversationSentiment {
    let labels: Vec<SentimentLabel> = messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .filter_map(|m| m.sentiment.as_ref().map(|s| s.label))
        .collect();
    let window = &labels[labels.len().saturating_sub(AGGREGATE_WINDOW)..];

    if window.is_empty() {
        return ConversationSentiment::neutral();
    }

    let count_of = |label: SentimentLabel| window.iter().filter(|l| **l == label).count();

    // ties favor the more negative label (checked first below)
    let mut overall = SentimentLabel::Neutral;
    let mut best_count = 0usize;
    for label in [
        SentimentLabel::Negative,
        SentimentLabel::Mixed,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ] {
        let count = count_of(label);
        if count > best_count {
            overall = label;
            best_count = count;
        }
    }

    let confidence = best_count as f32 / window.len() as f32;

    let user_frustration_detected = window
        .windows(2)
        .any(|pair| pair[0] == SentimentLabel::Negative && pair[1] == SentimentLabel::Negative);

    let trajectory = if window.len() > 1 {
        let first = label_score(window[0]);
        let last = label_score(window[window.len() - 1]);
        match last.cmp(&first) {
            std::cmp::Ordering::Greater => SentimentTrajectory::Improving,
            std::cmp::Ordering::Less => SentimentTrajectory::Declining,
            std::cmp::Ordering::Equal => SentimentTrajectory::Stable,
        }
    } else {
        SentimentTrajectory::Stable
    };

    ConversationSentiment {
        overall,
        confidence,
        trajectory,
        user_frustration_detected,
    }
}
