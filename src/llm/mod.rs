// src/llm/mod.rs

pub mod client;
pub mod sentiment;

pub use client::OpenAiChatClient;
pub use sentiment::RemoteSentimentClassifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Token counters reported by the backend. Exposed outward for billing and
/// analytics observers; the core never branches on them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Seam for the language-model backend. Production wires the HTTP client;
/// tests substitute canned or failing fakes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> anyhow::Result<ChatCompletion>;
}
