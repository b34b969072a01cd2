// src/notify/channels.rs

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::notify::dispatcher::{EscalationAlert, NotificationChannel};

/// Posts escalation alerts to a Slack incoming webhook.
pub struct SlackWebhookChannel {
    client: Client,
    webhook_url: String,
}

impl SlackWebhookChannel {
    pub fn new(client: Client, webhook_url: String) -> Self {
        Self { client, webhook_url }
    }
}

#[async_trait]
impl NotificationChannel for SlackWebhookChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, alert: &EscalationAlert) -> Result<()> {
        let payload = json!({
            "text": format!(
                ":rotating_light: Support escalation ({})",
                alert.priority
            ),
            "blocks": [
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!(
                            "*Conversation* `{}`\n*Customer* {}\n*Reason* {} | *Priority* {}\n*Sentiment* {} | *Intent* {}",
                            alert.conversation_id,
                            alert.user_email,
                            alert.reason,
                            alert.priority,
                            alert.sentiment,
                            alert.intent,
                        )
                    }
                },
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*Last message*\n> {}", alert.last_message)
                    }
                }
            ]
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Slack webhook returned {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }
        Ok(())
    }
}

/// Posts escalation alerts to the transactional email relay, addressed to
/// the support inbox.
pub struct EmailRelayChannel {
    client: Client,
    endpoint: String,
    api_key: String,
    support_inbox: String,
}

impl EmailRelayChannel {
    pub fn new(client: Client, endpoint: String, api_key: String, support_inbox: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            support_inbox,
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailRelayChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, alert: &EscalationAlert) -> Result<()> {
        let payload = json!({
            "to": self.support_inbox,
            "subject": format!(
                "[{}] Escalated conversation {} ({})",
                alert.priority, alert.conversation_id, alert.reason
            ),
            "body": format!(
                "Customer: {}\nReason: {}\nPriority: {}\nSentiment: {}\nIntent: {}\n\nSummary:\n{}\n\nLast message:\n{}\n",
                alert.user_email,
                alert.reason,
                alert.priority,
                alert.sentiment,
                alert.intent,
                alert.summary,
                alert.last_message,
            ),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Email relay returned {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }
        Ok(())
    }
}
