// src/knowledge/types.rs

use serde::{Deserialize, Serialize};

/// Provenance for one stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub category: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// One embedded knowledge-base passage. Immutable once stored; replaced
/// only on a full knowledge-base rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A retrieval hit: the chunk's text and provenance plus its cosine
/// similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

impl ScoredChunk {
    pub fn citation(&self) -> Citation {
        Citation {
            source: self.metadata.source.clone(),
            category: self.metadata.category.clone(),
        }
    }
}

/// What an assistant message records about the passages that grounded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub category: String,
}

/// Cosine similarity between two embeddings; 0 on dimension mismatch or a
/// zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
