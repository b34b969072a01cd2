// src/knowledge/retriever.rs

use std::sync::Arc;
use tracing::{debug, warn};

use crate::TurnError;
use crate::knowledge::embedder::Embedder;
use crate::knowledge::index::VectorIndex;
use crate::knowledge::types::ScoredChunk;

/// Read-only semantic search over the knowledge base. Retrieval failure
/// degrades to ungrounded generation: `search` never errors, it returns an
/// empty list and logs.
pub struct KnowledgeRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl KnowledgeRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub async fn search(&self, query: &str, limit: usize, threshold: f32) -> Vec<ScoredChunk> {
        match self.try_search(query, limit, threshold).await {
            Ok(chunks) => {
                debug!(hits = chunks.len(), "knowledge retrieval complete");
                chunks
            }
            Err(e) => {
                warn!("{e}; continuing without grounding context");
                Vec::new()
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>, TurnError> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| TurnError::RetrievalUnavailable(e.to_string()))?;

        let mut chunks = self
            .index
            .search(&embedding, threshold, limit)
            .await
            .map_err(|e| TurnError::RetrievalUnavailable(e.to_string()))?;

        // the index already applies threshold and limit; re-enforce the
        // contract locally so a lax backend cannot widen it
        chunks.retain(|c| c.similarity >= threshold);
        chunks.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        chunks.truncate(limit);
        Ok(chunks)
    }
}
