// src/conversation/traits.rs

//! Store seam for conversations. All persistence goes through this; no
//! direct DB calls in the turn pipeline.

use async_trait::async_trait;

use crate::conversation::types::{Conversation, ConversationSummary};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Point lookup scoped to the owning user.
    async fn get(&self, conversation_id: &str, user_id: &str)
    -> anyhow::Result<Option<Conversation>>;

    /// Existence-checked write: insert when the id is new, otherwise replace
    /// the whole row with the given document. No unique-constraint upsert is
    /// assumed, so two concurrent writers on one id can race read-then-write
    /// and the later write wins in full. Accepted and documented; never a
    /// partial merge.
    async fn upsert(&self, conversation: &Conversation) -> anyhow::Result<Conversation>;

    /// Hand the conversation to a human agent. Errors on unknown ids and on
    /// Resolved conversations (no transition out of Resolved except reopen).
    async fn assign(&self, conversation_id: &str, agent: &str) -> anyhow::Result<Conversation>;

    /// Close the conversation. Valid from Active or Assigned; resolving an
    /// already-Resolved conversation overwrites the resolution fields.
    async fn resolve(
        &self,
        conversation_id: &str,
        resolved_by: &str,
        notes: Option<&str>,
    ) -> anyhow::Result<Conversation>;

    /// Read-only aggregation surface for analytics observers.
    async fn summaries(&self) -> anyhow::Result<Vec<ConversationSummary>>;
}
