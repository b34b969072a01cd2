// src/knowledge/ingest.rs

//! Offline knowledge-base ingestion: chunk, embed, upsert.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::knowledge::embedder::Embedder;
use crate::knowledge::index::VectorIndex;
use crate::knowledge::types::{ChunkMetadata, KnowledgeChunk};

/// Words per chunk and overlapping words between adjacent chunks.
const CHUNK_WORDS: usize = 220;
const CHUNK_OVERLAP_WORDS: usize = 40;

/// Split text into overlapping word windows. Short inputs come back as a
/// single chunk.
pub fn chunk_text(text: &str, chunk_words: usize, overlap_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= chunk_words {
        return vec![words.join(" ")];
    }

    let step = chunk_words.saturating_sub(overlap_words).max(1);
    let mut chunks = Vec::new();
    let mut start_idx = 0;

    while start_idx < words.len() {
        let end_idx = usize::min(start_idx + chunk_words, words.len());
        chunks.push(words[start_idx..end_idx].join(" "));
        if end_idx == words.len() {
            break;
        }
        start_idx += step;
    }

    chunks
}

pub struct KnowledgeIngestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl KnowledgeIngestor {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Chunk one document, embed every chunk, and upsert the batch.
    /// Returns the number of chunks stored.
    pub async fn ingest_document(&self, source: &str, category: &str, text: &str) -> Result<usize> {
        self.index
            .ensure_collection()
            .await
            .context("Failed to prepare vector collection")?;

        let pieces = chunk_text(text, CHUNK_WORDS, CHUNK_OVERLAP_WORDS);
        let total_chunks = pieces.len();
        if total_chunks == 0 {
            return Ok(0);
        }

        let mut chunks = Vec::with_capacity(total_chunks);
        for (chunk_index, content) in pieces.into_iter().enumerate() {
            let embedding = self
                .embedder
                .embed(&content)
                .await
                .with_context(|| format!("Failed to embed chunk {chunk_index} of {source}"))?;
            chunks.push(KnowledgeChunk {
                content,
                embedding,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    category: category.to_string(),
                    chunk_index,
                    total_chunks,
                },
            });
        }

        self.index.upsert(&chunks).await?;
        info!(source, chunks = total_chunks, "knowledge document ingested");
        Ok(total_chunks)
    }
}
