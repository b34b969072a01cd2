// src/signals/mod.rs

//! Per-message and per-conversation signal extraction.
//!
//! Sentiment goes through a classifier seam with two implementations: the
//! remote LLM-backed scorer and the lexicon heuristic. Intent is purely
//! lexical and deterministic. Aggregation folds the last few user messages
//! into a conversation-level sentiment with a frustration flag.

pub mod aggregate;
pub mod intent;
pub mod sentiment;

use std::sync::Arc;
use tracing::warn;

use crate::TurnError;
use crate::conversation::types::Message;
pub use aggregate::{ConversationSentiment, SentimentTrajectory};
pub use intent::{Intent, IntentLabel, IntentPriority};
pub use sentiment::{
    LexiconSentimentClassifier, Sentiment, SentimentClassifier, SentimentDistribution,
    SentimentLabel,
};

/// Facade over sentiment, intent, and aggregate extraction. The optional
/// remote classifier is chosen at construction; the lexicon heuristic is
/// always present and takes over when the remote backend errors.
pub struct SignalExtractor {
    remote: Option<Arc<dyn SentimentClassifier>>,
    fallback: LexiconSentimentClassifier,
}

impl SignalExtractor {
    pub fn new(remote: Option<Arc<dyn SentimentClassifier>>) -> Self {
        Self {
            remote,
            fallback: LexiconSentimentClassifier,
        }
    }

    pub fn heuristic_only() -> Self {
        Self::new(None)
    }

    /// Score one user message. Never fails: a remote backend error is logged
    /// and the heuristic result is returned instead.
    pub async fn sentiment(&self, message: &str) -> Sentiment {
        if let Some(remote) = &self.remote {
            match remote.analyze(message).await {
                Ok(sentiment) => return sentiment,
                Err(e) => {
                    let err = TurnError::SignalBackendUnavailable(e.to_string());
                    warn!("{err}; using lexicon fallback");
                }
            }
        }
        self.fallback.score(message)
    }

    /// Classify the message's intent. Pure and total.
    pub fn intent(&self, message: &str) -> Intent {
        intent::classify(message)
    }

    /// Fold the conversation's recent user messages into an overall
    /// sentiment, trajectory, and frustration flag.
    pub fn aggregate(&self, messages: &[Message]) -> ConversationSentiment {
        aggregate::aggregate(messages)
    }
}
