// src/llm/client.rs

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::llm::{ChatBackend, ChatCompletion, ChatMessage, TokenUsage};

/// Client for an OpenAI-compatible `/chat/completions` endpoint (the Azure
/// deployment speaks the same dialect). The reqwest client carries the call
/// timeout so a stuck backend fails the turn's generation step instead of
/// hanging it.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(client: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    async fn post_completions(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Chat API error {}: {}", status, error_text));
        }

        response.json().await.context("Failed to parse chat response")
    }

    fn extract_text(response: &Value) -> Result<String> {
        response
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Chat response carried no message content: {response:?}"))
    }

    fn extract_usage(response: &Value) -> TokenUsage {
        TokenUsage {
            prompt_tokens: response
                .pointer("/usage/prompt_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            completion_tokens: response
                .pointer("/usage/completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: response
                .pointer("/usage/total_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        }
    }

    /// Completion constrained to a JSON schema, for structured extraction
    /// calls (sentiment scoring). Returns the parsed JSON payload.
    pub async fn complete_structured(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: Value,
    ) -> Result<Value> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0.0,
            "max_tokens": 256,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema_name,
                    "strict": true,
                    "schema": schema,
                }
            },
        });

        let response = self.post_completions(payload).await?;
        let text = Self::extract_text(&response)?;
        serde_json::from_str(&text).context("Structured completion was not valid JSON")
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ChatCompletion> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self.post_completions(payload).await?;
        Ok(ChatCompletion {
            text: Self::extract_text(&response)?,
            usage: Self::extract_usage(&response),
        })
    }
}
