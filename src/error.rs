// src/error.rs

//! Error taxonomy for a support turn.
//!
//! Two tiers: failures that only degrade answer *quality* (retrieval, the
//! sentiment backend) are absorbed inside the pipeline and logged; failures
//! that break *correctness or durability* (generation, persistence) propagate
//! to the caller as the turn's failure. Notification failures are best-effort
//! and never leave the background task that sent them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurnError {
    /// Knowledge backend or embedding call failed. Absorbed: the turn
    /// continues ungrounded.
    #[error("knowledge retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Remote sentiment backend failed. Absorbed: the lexicon heuristic
    /// takes over.
    #[error("signal backend unavailable: {0}")]
    SignalBackendUnavailable(String),

    /// Language-model call failed or timed out. The turn fails; no canned
    /// reply is substituted.
    #[error("response generation failed: {0}")]
    Generation(String),

    /// Conversation store write or read failed. The turn fails even when a
    /// reply was already generated.
    #[error("conversation persistence failed: {0}")]
    Persistence(String),

    /// A notification channel failed. Logged by the dispatcher, never
    /// surfaced, never retried.
    #[error("notification dispatch failed: {0}")]
    Notification(String),
}

impl TurnError {
    /// Whether this failure is absorbed with graceful degradation rather
    /// than ending the turn.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TurnError::RetrievalUnavailable(_)
                | TurnError::SignalBackendUnavailable(_)
                | TurnError::Notification(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_failures_are_recoverable_and_correctness_failures_are_not() {
        assert!(TurnError::RetrievalUnavailable("down".into()).is_recoverable());
        assert!(TurnError::SignalBackendUnavailable("down".into()).is_recoverable());
        assert!(TurnError::Notification("down".into()).is_recoverable());
        assert!(!TurnError::Generation("down".into()).is_recoverable());
        assert!(!TurnError::Persistence("down".into()).is_recoverable());
    }
}
