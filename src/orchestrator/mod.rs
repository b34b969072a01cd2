// src/orchestrator/mod.rs

//! Turn pipeline: load → retrieve → signal → decide → generate → persist →
//! notify, in that order, per incoming message.
//!
//! Error policy per step: retrieval and notification failures are absorbed
//! (the retriever degrades to no grounding; notification is fire-and-forget
//! after the turn persisted). Load, signal, generation, and persistence
//! failures end the turn, because a turn without valid state or a reply did not
//! happen.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::TurnError;
use crate::conversation::traits::ConversationStore;
use crate::conversation::types::{Conversation, ConversationSummary, Message};
use crate::escalation::{EscalationPolicy, EscalationReason, PolicyInput, Priority};
use crate::knowledge::retriever::KnowledgeRetriever;
use crate::knowledge::types::Citation;
use crate::llm::TokenUsage;
use crate::notify::dispatcher::{EscalationAlert, NotificationDispatcher};
use crate::response::generator::ResponseGenerator;
use crate::signals::SignalExtractor;
use crate::signals::intent::Intent;
use crate::signals::sentiment::{Sentiment, SentimentLabel};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub retrieval_limit: usize,
    pub retrieval_threshold: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retrieval_limit: 3,
            retrieval_threshold: 0.78,
        }
    }
}

/// One inbound user message. No `conversation_id` starts a new thread.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    pub conversation_id: Option<String>,
    pub user_id: String,
    pub user_email: String,
    pub message: String,
}

/// What the caller gets back for a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub conversation_id: String,
    pub reply: String,
    pub citations: Vec<Citation>,
    pub sentiment: Sentiment,
    pub intent: Intent,
    pub escalated: bool,
    pub escalation_reason: Option<EscalationReason>,
    pub priority: Priority,
    pub usage: TokenUsage,
}

pub struct SupportOrchestrator {
    store: Arc<dyn ConversationStore>,
    retriever: KnowledgeRetriever,
    signals: SignalExtractor,
    policy: EscalationPolicy,
    generator: ResponseGenerator,
    dispatcher: Arc<NotificationDispatcher>,
    config: OrchestratorConfig,
}

impl SupportOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        retriever: KnowledgeRetriever,
        signals: SignalExtractor,
        policy: EscalationPolicy,
        generator: ResponseGenerator,
        dispatcher: Arc<NotificationDispatcher>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            signals,
            policy,
            generator,
            dispatcher,
            config,
        }
    }

    #[instrument(skip_all, fields(user_id = %request.user_id))]
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnOutcome, TurnError> {
        // 1. load or create; a turn on a resolved thread reopens it
        let mut conversation = self.load_or_create(&request).await?;
        conversation.reopen();

        // 2. retrieval is tolerant: failure degrades to no grounding
        let retrieved = self
            .retriever
            .search(
                &request.message,
                self.config.retrieval_limit,
                self.config.retrieval_threshold,
            )
            .await;

        // 3. per-message signals, then the conversation-level aggregate
        //    including the incoming message
        let sentiment = self.signals.sentiment(&request.message).await;
        let intent = self.signals.intent(&request.message);

        let mut user_message = Message::user(request.message.clone());
        user_message.sentiment = Some(sentiment.clone());
        user_message.intent = Some(intent.clone());

        let mut messages = conversation.messages.clone();
        messages.push(user_message);
        let aggregate = self.signals.aggregate(&messages);

        // 4. escalation decision
        let decision = self.policy.decide(&PolicyInput {
            messages: &messages,
            sentiment: &aggregate,
            intent: &intent,
        });

        // 5. grounded generation; hand-off text appended when escalating
        let reply = self
            .generator
            .generate(
                &conversation.messages,
                &retrieved,
                &request.message,
                decision.should_escalate,
            )
            .await?;

        // 6. persist the full turn in one write: both messages plus every
        //    derived field
        let sources = (!reply.citations.is_empty()).then(|| reply.citations.clone());
        messages.push(Message::assistant(reply.text.clone(), sources));

        let now = Utc::now();
        conversation.messages = messages;
        conversation.sentiment = Some(aggregate.clone());
        conversation.intent = Some(intent.clone());
        conversation.priority = if decision.should_escalate {
            decision.priority
        } else {
            conversation.priority
        };
        // escalation is sticky until resolution; a later calm turn does not
        // silently un-flag a thread an agent may already be watching
        conversation.escalated = conversation.escalated || decision.should_escalate;
        conversation.escalation_reason = decision.reason.or(conversation.escalation_reason);
        conversation.updated_at = now;
        conversation.last_message_at = now;

        let persisted = self
            .store
            .upsert(&conversation)
            .await
            .map_err(|e| TurnError::Persistence(e.to_string()))?;

        info!(
            conversation_id = %persisted.conversation_id,
            escalated = decision.should_escalate,
            intent = %intent.label,
            sentiment = %sentiment.label,
            "turn complete"
        );

        // 7. best-effort alert, detached so it cannot fail the response
        if decision.should_escalate {
            if let Some(reason) = decision.reason {
                self.dispatcher.clone().dispatch_detached(EscalationAlert {
                    conversation_id: persisted.conversation_id.clone(),
                    user_email: persisted.user_email.clone(),
                    reason,
                    sentiment: aggregate.overall,
                    intent: intent.label,
                    last_message: request.message.clone(),
                    summary: summarize(&persisted),
                    priority: decision.priority,
                });
            }
        }

        Ok(TurnOutcome {
            conversation_id: persisted.conversation_id,
            reply: reply.text,
            citations: reply.citations,
            sentiment,
            intent,
            escalated: decision.should_escalate,
            escalation_reason: decision.reason,
            priority: decision.priority,
            usage: reply.usage,
        })
    }

    pub async fn assign(&self, conversation_id: &str, agent: &str) -> Result<Conversation, TurnError> {
        self.store
            .assign(conversation_id, agent)
            .await
            .map_err(|e| TurnError::Persistence(e.to_string()))
    }

    pub async fn resolve(
        &self,
        conversation_id: &str,
        resolved_by: &str,
        notes: Option<&str>,
    ) -> Result<Conversation, TurnError> {
        self.store
            .resolve(conversation_id, resolved_by, notes)
            .await
            .map_err(|e| TurnError::Persistence(e.to_string()))
    }

    pub async fn conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>, TurnError> {
        self.store
            .get(conversation_id, user_id)
            .await
            .map_err(|e| TurnError::Persistence(e.to_string()))
    }

    pub async fn summaries(&self) -> Result<Vec<ConversationSummary>, TurnError> {
        self.store
            .summaries()
            .await
            .map_err(|e| TurnError::Persistence(e.to_string()))
    }

    /// An unknown or foreign `conversation_id` starts a fresh thread rather
    /// than failing the turn; the response carries the authoritative id.
    async fn load_or_create(&self, request: &TurnRequest) -> Result<Conversation, TurnError> {
        if let Some(id) = &request.conversation_id {
            let existing = self
                .store
                .get(id, &request.user_id)
                .await
                .map_err(|e| TurnError::Persistence(e.to_string()))?;
            if let Some(conversation) = existing {
                return Ok(conversation);
            }
        }
        Ok(Conversation::new(
            request.user_id.clone(),
            request.user_email.clone(),
        ))
    }
}

/// Short digest for the notification payload.
fn summarize(conversation: &Conversation) -> String {
    let turns = conversation.assistant_turns();
    let opening = conversation
        .messages
        .first()
        .map(|m| snippet(&m.content, 140))
        .unwrap_or_default();
    let overall = conversation
        .sentiment
        .as_ref()
        .map(|s| s.overall)
        .unwrap_or(SentimentLabel::Neutral);
    format!(
        "{} assistant turn(s), overall sentiment {}. Opened with: {}",
        turns, overall, opening
    )
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}
