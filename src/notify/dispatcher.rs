// src/notify/dispatcher.rs

//! Best-effort escalation alerts. The dispatcher never retries, never
//! surfaces failures to the user, and never blocks the turn: the
//! orchestrator fires it on a detached task after the turn has persisted.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::TurnError;
use crate::escalation::{EscalationReason, Priority};
use crate::signals::intent::IntentLabel;
use crate::signals::sentiment::SentimentLabel;

/// Everything a human agent needs to pick up an escalated conversation.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationAlert {
    pub conversation_id: String,
    pub user_email: String,
    pub reason: EscalationReason,
    pub sentiment: SentimentLabel,
    pub intent: IntentLabel,
    pub last_message: String,
    pub summary: String,
    pub priority: Priority,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, alert: &EscalationAlert) -> anyhow::Result<()>;
}

pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    /// Fire the alert on every channel concurrently. Returns the
    /// per-channel success map; any single success counts as delivered.
    pub async fn dispatch(&self, alert: &EscalationAlert) -> HashMap<String, bool> {
        let sends = self.channels.iter().map(|channel| async move {
            let delivered = match channel.send(alert).await {
                Ok(()) => true,
                Err(e) => {
                    let err = TurnError::Notification(format!("{}: {e}", channel.name()));
                    warn!("{err}");
                    false
                }
            };
            (channel.name().to_string(), delivered)
        });

        let results: HashMap<String, bool> = join_all(sends).await.into_iter().collect();

        if results.values().any(|ok| *ok) {
            info!(
                conversation_id = %alert.conversation_id,
                reason = %alert.reason,
                "escalation alert delivered"
            );
        } else if !results.is_empty() {
            warn!(
                conversation_id = %alert.conversation_id,
                "escalation alert failed on every channel"
            );
        }

        results
    }

    /// Fire-and-forget variant used from the turn pipeline.
    pub fn dispatch_detached(self: Arc<Self>, alert: EscalationAlert) {
        tokio::spawn(async move {
            self.dispatch(&alert).await;
        });
    }
}
