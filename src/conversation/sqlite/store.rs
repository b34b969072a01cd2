//! Implements ConversationStore for SQLite.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::conversation::traits::ConversationStore;
use crate::conversation::types::{
    Conversation, ConversationStatus, ConversationSummary, Message,
};
use crate::escalation::Priority;
use crate::signals::aggregate::ConversationSentiment;
use crate::signals::intent::Intent;

pub struct SqliteConversationStore {
    pub pool: SqlitePool,
}

impl SqliteConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        super::migration::run_migrations(&self.pool).await
    }

    fn row_to_conversation(row: &SqliteRow) -> Result<Conversation> {
        let messages_json: String = row.get("messages");
        let messages: Vec<Message> = serde_json::from_str(&messages_json)
            .map_err(|e| anyhow!("Corrupt messages column: {e}"))?;

        let sentiment: Option<String> = row.get("sentiment");
        let sentiment = sentiment
            .as_deref()
            .and_then(|s| serde_json::from_str::<ConversationSentiment>(s).ok());

        let intent: Option<String> = row.get("intent");
        let intent = intent
            .as_deref()
            .and_then(|s| serde_json::from_str::<Intent>(s).ok());

        let priority: String = row.get("priority");
        let escalation_reason: Option<String> = row.get("escalation_reason");
        let status: String = row.get("status");

        let created_at: NaiveDateTime = row.get("created_at");
        let updated_at: NaiveDateTime = row.get("updated_at");
        let last_message_at: NaiveDateTime = row.get("last_message_at");
        let resolved_at: Option<NaiveDateTime> = row.get("resolved_at");

        Ok(Conversation {
            conversation_id: row.get("conversation_id"),
            user_id: row.get("user_id"),
            user_email: row.get("user_email"),
            messages,
            sentiment,
            intent,
            priority: priority.parse().unwrap_or(Priority::Low),
            escalated: row.get("escalated"),
            escalation_reason: escalation_reason.as_deref().and_then(|s| s.parse().ok()),
            status: status.parse().unwrap_or(ConversationStatus::Active),
            assigned_to: row.get("assigned_to"),
            created_at: Utc.from_utc_datetime(&created_at),
            updated_at: Utc.from_utc_datetime(&updated_at),
            last_message_at: Utc.from_utc_datetime(&last_message_at),
            resolved_at: resolved_at.map(|t| Utc.from_utc_datetime(&t)),
            resolved_by: row.get("resolved_by"),
            resolution_notes: row.get("resolution_notes"),
        })
    }

    async fn get_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn write_full_row(&self, conversation: &Conversation, exists: bool) -> Result<()> {
        let messages_json = serde_json::to_string(&conversation.messages)?;
        let sentiment_json = conversation
            .sentiment
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let intent_json = conversation
            .intent
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let reason = conversation.escalation_reason.map(|r| r.as_str().to_string());

        if exists {
            sqlx::query(
                r#"
                UPDATE conversations SET
                    user_id = ?, user_email = ?, messages = ?, sentiment = ?, intent = ?,
                    priority = ?, escalated = ?, escalation_reason = ?, status = ?,
                    assigned_to = ?, updated_at = ?, last_message_at = ?,
                    resolved_at = ?, resolved_by = ?, resolution_notes = ?
                WHERE conversation_id = ?
                "#,
            )
            .bind(&conversation.user_id)
            .bind(&conversation.user_email)
            .bind(&messages_json)
            .bind(&sentiment_json)
            .bind(&intent_json)
            .bind(conversation.priority.as_str())
            .bind(conversation.escalated)
            .bind(&reason)
            .bind(conversation.status.as_str())
            .bind(&conversation.assigned_to)
            .bind(conversation.updated_at.naive_utc())
            .bind(conversation.last_message_at.naive_utc())
            .bind(conversation.resolved_at.map(|t| t.naive_utc()))
            .bind(&conversation.resolved_by)
            .bind(&conversation.resolution_notes)
            .bind(&conversation.conversation_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO conversations (
                    conversation_id, user_id, user_email, messages, sentiment, intent,
                    priority, escalated, escalation_reason, status, assigned_to,
                    created_at, updated_at, last_message_at,
                    resolved_at, resolved_by, resolution_notes
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&conversation.conversation_id)
            .bind(&conversation.user_id)
            .bind(&conversation.user_email)
            .bind(&messages_json)
            .bind(&sentiment_json)
            .bind(&intent_json)
            .bind(conversation.priority.as_str())
            .bind(conversation.escalated)
            .bind(&reason)
            .bind(conversation.status.as_str())
            .bind(&conversation.assigned_to)
            .bind(conversation.created_at.naive_utc())
            .bind(conversation.updated_at.naive_utc())
            .bind(conversation.last_message_at.naive_utc())
            .bind(conversation.resolved_at.map(|t| t.naive_utc()))
            .bind(&conversation.resolved_by)
            .bind(&conversation.resolution_notes)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn get(&self, conversation_id: &str, user_id: &str) -> Result<Option<Conversation>> {
        let row =
            sqlx::query("SELECT * FROM conversations WHERE conversation_id = ? AND user_id = ?")
                .bind(conversation_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn upsert(&self, conversation: &Conversation) -> Result<Conversation> {
        // read-then-write: no backend-portable atomic upsert is assumed, so
        // the existence check and the write are two statements
        let exists = sqlx::query("SELECT 1 FROM conversations WHERE conversation_id = ?")
            .bind(&conversation.conversation_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        self.write_full_row(conversation, exists).await?;
        Ok(conversation.clone())
    }

    async fn assign(&self, conversation_id: &str, agent: &str) -> Result<Conversation> {
        let mut conversation = self
            .get_by_id(conversation_id)
            .await?
            .ok_or_else(|| anyhow!("Conversation not found: {conversation_id}"))?;

        if conversation.status == ConversationStatus::Resolved {
            return Err(anyhow!(
                "Cannot assign resolved conversation {conversation_id}"
            ));
        }

        conversation.status = ConversationStatus::Assigned;
        conversation.assigned_to = Some(agent.to_string());
        conversation.updated_at = Utc::now();

        self.write_full_row(&conversation, true).await?;
        Ok(conversation)
    }

    async fn resolve(
        &self,
        conversation_id: &str,
        resolved_by: &str,
        notes: Option<&str>,
    ) -> Result<Conversation> {
        let mut conversation = self
            .get_by_id(conversation_id)
            .await?
            .ok_or_else(|| anyhow!("Conversation not found: {conversation_id}"))?;

        // resolving twice overwrites the resolution fields; last wins
        conversation.status = ConversationStatus::Resolved;
        conversation.resolved_at = Some(Utc::now());
        conversation.resolved_by = Some(resolved_by.to_string());
        conversation.resolution_notes = notes.map(str::to_string);
        conversation.updated_at = Utc::now();

        self.write_full_row(&conversation, true).await?;
        Ok(conversation)
    }

    async fn summaries(&self) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, user_id, messages, sentiment, intent, priority,
                   escalated, status, created_at, last_message_at, resolved_at
            FROM conversations
            ORDER BY last_message_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let messages_json: String = row.get("messages");
            let message_count = serde_json::from_str::<Vec<Message>>(&messages_json)
                .map(|m| m.len())
                .unwrap_or(0);

            let sentiment: Option<String> = row.get("sentiment");
            let sentiment = sentiment
                .as_deref()
                .and_then(|s| serde_json::from_str::<ConversationSentiment>(s).ok())
                .map(|s| s.overall.as_str().to_string());

            let intent: Option<String> = row.get("intent");
            let intent = intent
                .as_deref()
                .and_then(|s| serde_json::from_str::<Intent>(s).ok())
                .map(|i| i.label.as_str().to_string());

            let priority: String = row.get("priority");
            let status: String = row.get("status");
            let created_at: NaiveDateTime = row.get("created_at");
            let last_message_at: NaiveDateTime = row.get("last_message_at");
            let resolved_at: Option<NaiveDateTime> = row.get("resolved_at");

            summaries.push(ConversationSummary {
                conversation_id: row.get("conversation_id"),
                user_id: row.get("user_id"),
                sentiment,
                intent,
                priority: priority.parse().unwrap_or(Priority::Low),
                escalated: row.get("escalated"),
                status: status.parse().unwrap_or(ConversationStatus::Active),
                message_count,
                created_at: Utc.from_utc_datetime(&created_at),
                last_message_at: Utc.from_utc_datetime(&last_message_at),
                resolved_at: resolved_at.map(|t| Utc.from_utc_datetime(&t)),
            });
        }

        Ok(summaries)
    }
}
