// src/llm/sentiment.rs

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::llm::OpenAiChatClient;
use crate::signals::sentiment::{
    Sentiment, SentimentClassifier, SentimentDistribution, SentimentLabel,
};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct ScoredSentiment {
    label: String,
    positive: f32,
    neutral: f32,
    negative: f32,
}

/// LLM-backed sentiment scorer. Transient backend errors (429/5xx) are
/// retried with jitter; anything else surfaces to the caller, which falls
/// back to the lexicon heuristic.
pub struct RemoteSentimentClassifier {
    client: OpenAiChatClient,
}

impl RemoteSentimentClassifier {
    pub fn new(client: OpenAiChatClient) -> Self {
        Self { client }
    }

    async fn analyze_attempt(&self, message: &str) -> Result<Sentiment> {
        let schema = json!({
            "type": "object",
            "properties": {
                "label": {
                    "type": "string",
                    "enum": ["positive", "neutral", "negative", "mixed"]
                },
                "positive": { "type": "number", "minimum": 0, "maximum": 1 },
                "neutral": { "type": "number", "minimum": 0, "maximum": 1 },
                "negative": { "type": "number", "minimum": 0, "maximum": 1 }
            },
            "required": ["label", "positive", "neutral", "negative"]
        });

        let raw = self
            .client
            .complete_structured(
                "Score the sentiment of a customer-support message. \
                 Return the dominant label and a probability over positive, neutral, \
                 and negative that sums to 1.",
                message,
                "sentiment_score",
                schema,
            )
            .await
            .context("Failed to call sentiment backend")?;

        let scored: ScoredSentiment =
            serde_json::from_value(raw).context("Failed to parse sentiment score")?;

        let sum = scored.positive + scored.neutral + scored.negative;
        if sum <= 0.0 {
            return Err(anyhow!("Sentiment backend returned an empty distribution"));
        }

        // renormalize so downstream thresholds see a proper distribution
        let distribution = SentimentDistribution {
            positive: scored.positive / sum,
            neutral: scored.neutral / sum,
            negative: scored.negative / sum,
        };
        let label: SentimentLabel = scored.label.parse().unwrap_or(SentimentLabel::Neutral);
        let confidence = match label {
            SentimentLabel::Positive => distribution.positive,
            SentimentLabel::Neutral => distribution.neutral,
            SentimentLabel::Negative => distribution.negative,
            SentimentLabel::Mixed => distribution.positive + distribution.negative,
        };

        Ok(Sentiment {
            label,
            confidence,
            distribution,
        })
    }
}

#[async_trait]
impl SentimentClassifier for RemoteSentimentClassifier {
    async fn analyze(&self, message: &str) -> Result<Sentiment> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.analyze_attempt(message).await {
                Ok(sentiment) => return Ok(sentiment),
                Err(e) if attempt < MAX_RETRIES => {
                    let error_str = e.to_string();
                    if error_str.contains("429") || error_str.contains("Chat API error 5") {
                        let jitter =
                            Duration::from_millis(100 * attempt as u64 + rand::random::<u64>() % 100);
                        warn!(
                            "Sentiment scoring attempt {} failed ({}), retrying after {:?}...",
                            attempt, error_str, jitter
                        );
                        sleep(jitter).await;
                        continue;
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
