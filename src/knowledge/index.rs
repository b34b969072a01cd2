// src/knowledge/index.rs

//! HTTP client for the Qdrant-style vector index.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::knowledge::types::{ChunkMetadata, KnowledgeChunk, ScoredChunk};

/// The similarity-search surface the core depends on. The shape,
/// `(query_embedding, match_threshold, match_count)` in and scored rows out,
/// is the contract; how the index is implemented is not.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ensure_collection(&self) -> Result<()>;

    async fn upsert(&self, chunks: &[KnowledgeChunk]) -> Result<()>;

    async fn search(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
    ) -> Result<Vec<ScoredChunk>>;
}

pub struct QdrantKnowledgeIndex {
    client: Client,
    base_url: String,
    collection: String,
    vector_dim: usize,
}

impl QdrantKnowledgeIndex {
    pub fn new(client: Client, base_url: String, collection: String, vector_dim: usize) -> Self {
        Self {
            client,
            base_url,
            collection,
            vector_dim,
        }
    }

    fn payload_to_chunk(payload: &Value, score: f32) -> Option<ScoredChunk> {
        Some(ScoredChunk {
            content: payload.get("content")?.as_str()?.to_string(),
            metadata: ChunkMetadata {
                source: payload.get("source")?.as_str()?.to_string(),
                category: payload
                    .get("category")
                    .and_then(|v| v.as_str())
                    .unwrap_or("general")
                    .to_string(),
                chunk_index: payload
                    .get("chunk_index")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as usize,
                total_chunks: payload
                    .get("total_chunks")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(1) as usize,
            },
            similarity: score,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantKnowledgeIndex {
    /// Idempotent: creates the collection if missing, succeeds if it
    /// already exists.
    async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let resp = self.client.get(&url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let req_body = json!({
            "vectors": {
                "size": self.vector_dim,
                "distance": "Cosine"
            }
        });
        let resp = self.client.put(&url).json(&req_body).send().await?;

        let status = resp.status();
        let err_body = resp.text().await.unwrap_or_default();
        if status.is_success() || status.as_u16() == 409 || err_body.contains("already exists") {
            Ok(())
        } else {
            Err(anyhow!("Failed to create vector collection: {}", err_body))
        }
    }

    async fn upsert(&self, chunks: &[KnowledgeChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": chunk.embedding,
                    "payload": {
                        "content": chunk.content,
                        "source": chunk.metadata.source,
                        "category": chunk.metadata.category,
                        "chunk_index": chunk.metadata.chunk_index,
                        "total_chunks": chunk.metadata.total_chunks,
                    }
                })
            })
            .collect();

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let resp = self
            .client
            .put(&url)
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| anyhow!("Vector index upsert error: {}", e))?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Vector index upsert failed: {}",
                resp.text().await.unwrap_or_default()
            ));
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );

        let req_body = json!({
            "vector": query_embedding,
            "limit": match_count,
            "score_threshold": match_threshold,
            "with_payload": true,
        });

        let resp = self
            .client
            .post(&url)
            .json(&req_body)
            .send()
            .await
            .map_err(|e| anyhow!("Vector index search error: {}", e))?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Vector index search failed: {}",
                resp.text().await.unwrap_or_default()
            ));
        }

        let body: Value = resp.json().await?;
        let hits = body
            .get("result")
            .and_then(|r| r.as_array())
            .ok_or_else(|| anyhow!("Malformed vector index response"))?;

        let chunks = hits
            .iter()
            .filter_map(|hit| {
                let score = hit.get("score")?.as_f64()? as f32;
                let payload = hit.get("payload")?;
                Self::payload_to_chunk(payload, score)
            })
            .collect();

        Ok(chunks)
    }
}
