// src/config/mod.rs
// All tunables load from .env / environment with typed defaults.

use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct KeystoneConfig {
    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Database
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Chat model backend (Azure OpenAI compatible)
    pub chat_base_url: String,
    pub chat_api_key: String,
    pub chat_model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
    pub chat_timeout_secs: u64,

    // ── Embeddings backend
    pub embeddings_base_url: String,
    pub embeddings_api_key: String,
    pub embeddings_model: String,
    pub embedding_dim: usize,
    pub embeddings_timeout_secs: u64,

    // ── Vector index
    pub vector_index_url: String,
    pub vector_collection: String,
    pub vector_timeout_secs: u64,

    // ── Knowledge retrieval
    pub retrieval_limit: usize,
    pub retrieval_threshold: f32,

    // ── Signals
    pub remote_sentiment_enabled: bool,
    pub sentiment_timeout_secs: u64,

    // ── Escalation policy
    pub escalation_sentiment_threshold: f32,
    pub escalation_max_assistant_turns: usize,

    // ── Response generation
    pub history_window: usize,

    // ── Notifications
    pub slack_webhook_url: String,
    pub email_relay_url: String,
    pub email_relay_api_key: String,
    pub support_inbox: String,
    pub notify_timeout_secs: u64,
}

// Values may carry trailing comments in .env files; strip before parsing.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl KeystoneConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            host: env_var_or("KEYSTONE_HOST", "0.0.0.0".to_string()),
            port: env_var_or("KEYSTONE_PORT", 8080),
            cors_origin: env_var_or("KEYSTONE_CORS_ORIGIN", "http://localhost:3000".to_string()),
            database_url: env_var_or("DATABASE_URL", "sqlite:./keystone.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 10),
            chat_base_url: env_var_or(
                "KEYSTONE_CHAT_BASE_URL",
                "https://api.openai.com/v1".to_string(),
            ),
            chat_api_key: env_var_or("KEYSTONE_CHAT_API_KEY", String::new()),
            chat_model: env_var_or("KEYSTONE_CHAT_MODEL", "gpt-4o-mini".to_string()),
            chat_temperature: env_var_or("KEYSTONE_CHAT_TEMPERATURE", 0.3),
            chat_max_tokens: env_var_or("KEYSTONE_CHAT_MAX_TOKENS", 512),
            chat_timeout_secs: env_var_or("KEYSTONE_CHAT_TIMEOUT", 8),
            embeddings_base_url: env_var_or(
                "KEYSTONE_EMBEDDINGS_BASE_URL",
                "https://api.openai.com/v1".to_string(),
            ),
            embeddings_api_key: env_var_or("KEYSTONE_EMBEDDINGS_API_KEY", String::new()),
            embeddings_model: env_var_or(
                "KEYSTONE_EMBEDDINGS_MODEL",
                "text-embedding-3-small".to_string(),
            ),
            embedding_dim: env_var_or("KEYSTONE_EMBEDDING_DIM", 1536),
            embeddings_timeout_secs: env_var_or("KEYSTONE_EMBEDDINGS_TIMEOUT", 5),
            vector_index_url: env_var_or(
                "KEYSTONE_VECTOR_INDEX_URL",
                "http://localhost:6333".to_string(),
            ),
            vector_collection: env_var_or(
                "KEYSTONE_VECTOR_COLLECTION",
                "keystone-knowledge".to_string(),
            ),
            vector_timeout_secs: env_var_or("KEYSTONE_VECTOR_TIMEOUT", 5),
            retrieval_limit: env_var_or("KEYSTONE_RETRIEVAL_LIMIT", 3),
            retrieval_threshold: env_var_or("KEYSTONE_RETRIEVAL_THRESHOLD", 0.78),
            remote_sentiment_enabled: env_var_or("KEYSTONE_REMOTE_SENTIMENT", false),
            sentiment_timeout_secs: env_var_or("KEYSTONE_SENTIMENT_TIMEOUT", 5),
            escalation_sentiment_threshold: env_var_or("KEYSTONE_ESCALATION_SENTIMENT_THRESHOLD", 0.75),
            escalation_max_assistant_turns: env_var_or("KEYSTONE_ESCALATION_MAX_TURNS", 4),
            history_window: env_var_or("KEYSTONE_HISTORY_WINDOW", 10),
            slack_webhook_url: env_var_or("KEYSTONE_SLACK_WEBHOOK_URL", String::new()),
            email_relay_url: env_var_or("KEYSTONE_EMAIL_RELAY_URL", String::new()),
            email_relay_api_key: env_var_or("KEYSTONE_EMAIL_RELAY_API_KEY", String::new()),
            support_inbox: env_var_or("KEYSTONE_SUPPORT_INBOX", "support@keystone.app".to_string()),
            notify_timeout_secs: env_var_or("KEYSTONE_NOTIFY_TIMEOUT", 5),
        }
    }
}
