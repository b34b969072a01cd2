// src/state.rs

//! Explicit dependency assembly: every client is constructed once from
//! config and injected, so tests can swap fakes in without touching
//! process-wide state.

use anyhow::{Context, Result};
use reqwest::Client;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::KeystoneConfig;
use crate::conversation::sqlite::store::SqliteConversationStore;
use crate::escalation::{EscalationConfig, EscalationPolicy};
use crate::knowledge::embedder::{Embedder, HttpEmbedder};
use crate::knowledge::index::{QdrantKnowledgeIndex, VectorIndex};
use crate::knowledge::ingest::KnowledgeIngestor;
use crate::knowledge::retriever::KnowledgeRetriever;
use crate::llm::{OpenAiChatClient, RemoteSentimentClassifier};
use crate::notify::channels::{EmailRelayChannel, SlackWebhookChannel};
use crate::notify::dispatcher::{NotificationChannel, NotificationDispatcher};
use crate::orchestrator::{OrchestratorConfig, SupportOrchestrator};
use crate::response::generator::{GeneratorConfig, ResponseGenerator};
use crate::signals::{SignalExtractor, sentiment::SentimentClassifier};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SupportOrchestrator>,
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

fn build_embedder(config: &KeystoneConfig) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(HttpEmbedder::new(
        http_client(config.embeddings_timeout_secs)?,
        config.embeddings_base_url.clone(),
        config.embeddings_api_key.clone(),
        config.embeddings_model.clone(),
        config.embedding_dim,
    )))
}

fn build_vector_index(config: &KeystoneConfig) -> Result<Arc<dyn VectorIndex>> {
    Ok(Arc::new(QdrantKnowledgeIndex::new(
        http_client(config.vector_timeout_secs)?,
        config.vector_index_url.clone(),
        config.vector_collection.clone(),
        config.embedding_dim,
    )))
}

fn build_notification_channels(config: &KeystoneConfig) -> Result<Vec<Arc<dyn NotificationChannel>>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    if !config.slack_webhook_url.is_empty() {
        channels.push(Arc::new(SlackWebhookChannel::new(
            http_client(config.notify_timeout_secs)?,
            config.slack_webhook_url.clone(),
        )));
    }
    if !config.email_relay_url.is_empty() {
        channels.push(Arc::new(EmailRelayChannel::new(
            http_client(config.notify_timeout_secs)?,
            config.email_relay_url.clone(),
            config.email_relay_api_key.clone(),
            config.support_inbox.clone(),
        )));
    }

    if channels.is_empty() {
        info!("No notification channels configured - escalations will only be logged");
    }
    Ok(channels)
}

/// Build the full application state from config. The SQLite pool is created
/// and migrated here; every external client gets its own bounded timeout.
pub async fn build_app_state(config: &KeystoneConfig) -> Result<AppState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.sqlite_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to open conversation database")?;

    let store = SqliteConversationStore::new(pool);
    store.run_migrations().await?;

    let retriever = KnowledgeRetriever::new(build_embedder(config)?, build_vector_index(config)?);

    let chat_client = OpenAiChatClient::new(
        http_client(config.chat_timeout_secs)?,
        config.chat_base_url.clone(),
        config.chat_api_key.clone(),
        config.chat_model.clone(),
    );

    let remote_sentiment: Option<Arc<dyn SentimentClassifier>> = if config.remote_sentiment_enabled {
        let sentiment_client = OpenAiChatClient::new(
            http_client(config.sentiment_timeout_secs)?,
            config.chat_base_url.clone(),
            config.chat_api_key.clone(),
            config.chat_model.clone(),
        );
        Some(Arc::new(RemoteSentimentClassifier::new(sentiment_client)))
    } else {
        None
    };
    let signals = SignalExtractor::new(remote_sentiment);

    let policy = EscalationPolicy::new(EscalationConfig {
        negative_confidence_threshold: config.escalation_sentiment_threshold,
        max_assistant_turns: config.escalation_max_assistant_turns,
        ..EscalationConfig::default()
    });

    let generator = ResponseGenerator::new(
        Arc::new(chat_client),
        GeneratorConfig {
            temperature: config.chat_temperature,
            max_tokens: config.chat_max_tokens,
            history_window: config.history_window,
            ..GeneratorConfig::default()
        },
    );

    let dispatcher = Arc::new(NotificationDispatcher::new(build_notification_channels(
        config,
    )?));

    let orchestrator = Arc::new(SupportOrchestrator::new(
        Arc::new(store),
        retriever,
        signals,
        policy,
        generator,
        dispatcher,
        OrchestratorConfig {
            retrieval_limit: config.retrieval_limit,
            retrieval_threshold: config.retrieval_threshold,
        },
    ));

    Ok(AppState { orchestrator })
}

/// Ingestion wiring for the offline pipeline; shares the embedder and
/// index construction with the server path.
pub fn build_ingestor(config: &KeystoneConfig) -> Result<KnowledgeIngestor> {
    Ok(KnowledgeIngestor::new(
        build_embedder(config)?,
        build_vector_index(config)?,
    ))
}
