// src/signals/sentiment.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share of probability mass the heuristic always leaves on neutral, so a
/// single lexicon hit never claims full certainty.
const NEUTRAL_FLOOR: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Mixed => "mixed",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            "mixed" => SentimentLabel::Mixed,
            _ => SentimentLabel::Neutral,
        })
    }
}

/// Probability-like mass over the three base classes; sums to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f32,
    pub neutral: f32,
    pub negative: f32,
}

impl SentimentDistribution {
    pub fn sum(&self) -> f32 {
        self.positive + self.neutral + self.negative
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub confidence: f32,
    pub distribution: SentimentDistribution,
}

impl Sentiment {
    /// Low-confidence neutral used for empty input and as the safe default.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.5,
            distribution: SentimentDistribution {
                positive: 0.25,
                neutral: 0.5,
                negative: 0.25,
            },
        }
    }
}

/// Seam for per-message sentiment scoring. Production wires either the
/// remote LLM-backed scorer or the lexicon heuristic; tests substitute fakes.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn analyze(&self, message: &str) -> anyhow::Result<Sentiment>;
}

static NEGATIVE_LEXICON: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "terrible",
        "awful",
        "horrible",
        "useless",
        "worst",
        "hate",
        "angry",
        "furious",
        "frustrated",
        "frustrating",
        "annoyed",
        "annoying",
        "unacceptable",
        "disappointed",
        "disappointing",
        "ridiculous",
        "nothing works",
        "not working",
        "doesn't work",
        "does not work",
        "broken",
        "waste of",
        "fed up",
        "garbage",
        "pathetic",
    ]
});

static POSITIVE_LEXICON: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "thank you",
        "thanks",
        "great",
        "awesome",
        "love",
        "perfect",
        "excellent",
        "amazing",
        "fantastic",
        "wonderful",
        "brilliant",
        "helpful",
        "appreciate",
        "works now",
        "solved",
        "well done",
    ]
});

/// Keyword-overlap sentiment scorer. Total: every input, including the empty
/// string, yields a label and a distribution summing to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentimentClassifier;

impl LexiconSentimentClassifier {
    pub fn score(&self, message: &str) -> Sentiment {
        let lowered = message.to_lowercase();

        let negative_hits = NEGATIVE_LEXICON.iter().filter(|kw| lowered.contains(*kw)).count();
        let positive_hits = POSITIVE_LEXICON.iter().filter(|kw| lowered.contains(*kw)).count();

        if negative_hits == 0 && positive_hits == 0 {
            return Sentiment::neutral();
        }

        let total = (negative_hits + positive_hits) as f32;
        let mass = 1.0 - NEUTRAL_FLOOR;
        let distribution = SentimentDistribution {
            positive: positive_hits as f32 / total * mass,
            neutral: NEUTRAL_FLOOR,
            negative: negative_hits as f32 / total * mass,
        };

        let (label, confidence) = if negative_hits > positive_hits {
            (SentimentLabel::Negative, distribution.negative)
        } else if positive_hits > negative_hits {
            (SentimentLabel::Positive, distribution.positive)
        } else {
            // equal non-zero counts
            (SentimentLabel::Mixed, distribution.positive + distribution.negative)
        };

        Sentiment {
            label,
            confidence,
            distribution,
        }
    }
}

#[async_trait]
impl SentimentClassifier for LexiconSentimentClassifier {
    async fn analyze(&self, message: &str) -> anyhow::Result<Sentiment> {
        Ok(self.score(message))
    }
}
