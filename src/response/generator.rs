// src/response/generator.rs

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use crate::TurnError;
use crate::conversation::types::Message;
use crate::knowledge::types::{Citation, ScoredChunk};
use crate::llm::{ChatBackend, ChatMessage, TokenUsage};

const DEFAULT_SYSTEM_PROMPT: &str = "You are the support assistant for Keystone, a property-investment \
platform. Answer concisely and accurately. When knowledge base articles are provided, prefer them over \
general knowledge and do not invent platform behavior. If you cannot help, say so plainly.";

const HANDOFF_NOTICE: &str = "I've looped in our support team and a specialist will follow up with you shortly.";

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub system_prompt: String,
    /// Most recent history messages included in the prompt.
    pub history_window: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_window: 10,
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub text: String,
    pub citations: Vec<Citation>,
    pub usage: TokenUsage,
}

/// Assembles the grounded prompt and invokes the language model. Unlike
/// retrieval, a backend failure here fails the turn: no canned substitute.
pub struct ResponseGenerator {
    backend: Arc<dyn ChatBackend>,
    config: GeneratorConfig,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, config: GeneratorConfig) -> Self {
        Self { backend, config }
    }

    pub async fn generate(
        &self,
        history: &[Message],
        retrieved: &[ScoredChunk],
        new_message: &str,
        escalated: bool,
    ) -> Result<GeneratedReply, TurnError> {
        let prompt = self.build_prompt(history, retrieved, new_message);
        debug!(
            prompt_messages = prompt.len(),
            grounded = !retrieved.is_empty(),
            "invoking chat backend"
        );

        let completion = self
            .backend
            .complete(&prompt, self.config.temperature, self.config.max_tokens)
            .await
            .map_err(|e| TurnError::Generation(e.to_string()))?;

        // the hand-off sentence is appended exactly once, after generation,
        // so the model's own text never competes with it
        let text = if escalated {
            format!("{}\n\n{}", completion.text.trim_end(), HANDOFF_NOTICE)
        } else {
            completion.text
        };

        Ok(GeneratedReply {
            text,
            citations: retrieved.iter().map(ScoredChunk::citation).collect(),
            usage: completion.usage,
        })
    }

    fn build_prompt(
        &self,
        history: &[Message],
        retrieved: &[ScoredChunk],
        new_message: &str,
    ) -> Vec<ChatMessage> {
        let mut system = self.config.system_prompt.clone();
        if !retrieved.is_empty() {
            system.push_str("\n\nRelevant knowledge base articles:\n");
            for (i, chunk) in retrieved.iter().enumerate() {
                let _ = write!(
                    system,
                    "\n[{}] {} ({})\n{}\n",
                    i + 1,
                    chunk.metadata.source,
                    chunk.metadata.category,
                    chunk.content
                );
            }
        }

        let mut prompt = vec![ChatMessage::system(system)];

        let window_start = history.len().saturating_sub(self.config.history_window);
        for message in &history[window_start..] {
            prompt.push(ChatMessage {
                role: message.role.as_str().to_string(),
                content: message.content.clone(),
            });
        }

        prompt.push(ChatMessage::user(new_message));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::types::ChunkMetadata;
    use crate::llm::ChatCompletion;
    use async_trait::async_trait;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> anyhow::Result<ChatCompletion> {
            Ok(ChatCompletion {
                text: self.0.to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> anyhow::Result<ChatCompletion> {
            Err(anyhow::anyhow!("backend down"))
        }
    }

    fn chunk(source: &str, content: &str) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                category: "faq".to_string(),
                chunk_index: 0,
                total_chunks: 1,
            },
            similarity: 0.9,
        }
    }

    fn generator(backend: Arc<dyn ChatBackend>) -> ResponseGenerator {
        ResponseGenerator::new(backend, GeneratorConfig::default())
    }

    #[tokio::test]
    async fn handoff_notice_is_appended_once_after_generation() {
        let generator = generator(Arc::new(CannedBackend("Here is the answer.")));
        let reply = generator.generate(&[], &[], "help", true).await.unwrap();
        assert!(reply.text.starts_with("Here is the answer."));
        assert_eq!(reply.text.matches(HANDOFF_NOTICE).count(), 1);
    }

    #[tokio::test]
    async fn non_escalated_reply_carries_no_handoff() {
        let generator = generator(Arc::new(CannedBackend("Answer.")));
        let reply = generator.generate(&[], &[], "help", false).await.unwrap();
        assert_eq!(reply.text, "Answer.");
    }

    #[tokio::test]
    async fn citations_mirror_retrieved_chunks() {
        let generator = generator(Arc::new(CannedBackend("ok")));
        let chunks = vec![chunk("pricing.md", "plans start at $29")];
        let reply = generator.generate(&[], &chunks, "pricing?", false).await.unwrap();
        assert_eq!(reply.citations.len(), 1);
        assert_eq!(reply.citations[0].source, "pricing.md");
    }

    #[tokio::test]
    async fn backend_failure_is_a_generation_error() {
        let generator = generator(Arc::new(FailingBackend));
        let err = generator.generate(&[], &[], "help", false).await.unwrap_err();
        assert!(matches!(err, TurnError::Generation(_)));
    }

    #[test]
    fn prompt_keeps_only_the_trailing_history_window() {
        let generator = generator(Arc::new(CannedBackend("ok")));
        let history: Vec<Message> = (0..15)
            .map(|i| Message::user(format!("message {i}")))
            .collect();
        let prompt = generator.build_prompt(&history, &[], "latest");
        // system + 10 history + new message
        assert_eq!(prompt.len(), 12);
        assert_eq!(prompt[1].content, "message 5");
        assert_eq!(prompt.last().unwrap().content, "latest");
    }

    #[test]
    fn retrieved_chunks_land_in_the_system_message() {
        let generator = generator(Arc::new(CannedBackend("ok")));
        let chunks = vec![chunk("onboarding.md", "connect your portfolio first")];
        let prompt = generator.build_prompt(&[], &chunks, "how do I start?");
        assert!(prompt[0].content.contains("connect your portfolio first"));
        assert!(prompt[0].content.contains("onboarding.md"));
    }
}
