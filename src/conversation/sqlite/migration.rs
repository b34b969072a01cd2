// src/conversation/sqlite/migration.rs
//! Ensures the conversations table matches the latest schema.
//! Run this at startup to guarantee schema compatibility.
use anyhow::Result;
use sqlx::{Executor, SqlitePool};

/// Latest schema for conversations. Add columns here as fields evolve.
const CREATE_CONVERSATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    conversation_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    user_email TEXT NOT NULL,
    messages TEXT NOT NULL,
    sentiment TEXT,
    intent TEXT,
    priority TEXT NOT NULL DEFAULT 'low',
    escalated BOOLEAN NOT NULL DEFAULT 0,
    escalation_reason TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    assigned_to TEXT,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    last_message_at DATETIME NOT NULL,
    resolved_at DATETIME,
    resolved_by TEXT,
    resolution_notes TEXT
);
"#;

const CREATE_CONVERSATION_INDICES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id);
CREATE INDEX IF NOT EXISTS idx_conversations_status ON conversations(status);
CREATE INDEX IF NOT EXISTS idx_conversations_last_message_at ON conversations(last_message_at);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    pool.execute(CREATE_CONVERSATIONS).await?;
    pool.execute(CREATE_CONVERSATION_INDICES).await?;
    Ok(())
}
