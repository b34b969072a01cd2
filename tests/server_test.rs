// tests/server_test.rs
//
// Router-level smoke tests driven through tower's oneshot, no sockets.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

use keystone::conversation::sqlite::store::SqliteConversationStore;
use keystone::conversation::traits::ConversationStore;
use keystone::escalation::{EscalationConfig, EscalationPolicy};
use keystone::knowledge::embedder::Embedder;
use keystone::knowledge::index::VectorIndex;
use keystone::knowledge::retriever::KnowledgeRetriever;
use keystone::knowledge::types::{KnowledgeChunk, ScoredChunk};
use keystone::llm::{ChatBackend, ChatCompletion, ChatMessage, TokenUsage};
use keystone::notify::dispatcher::NotificationDispatcher;
use keystone::orchestrator::{OrchestratorConfig, SupportOrchestrator};
use keystone::response::generator::{GeneratorConfig, ResponseGenerator};
use keystone::server::create_router;
use keystone::signals::SignalExtractor;
use keystone::state::AppState;

struct NoopEmbedder;

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; 4])
    }
}

struct EmptyIndex;

#[async_trait]
impl VectorIndex for EmptyIndex {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _chunks: &[KnowledgeChunk]) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        _query_embedding: &[f32],
        _match_threshold: f32,
        _match_count: usize,
    ) -> Result<Vec<ScoredChunk>> {
        Ok(Vec::new())
    }
}

struct CannedChat;

#[async_trait]
impl ChatBackend for CannedChat {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<ChatCompletion> {
        Ok(ChatCompletion {
            text: "Happy to help.".to_string(),
            usage: TokenUsage::default(),
        })
    }
}

async fn test_state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool.");
    let store = Arc::new(SqliteConversationStore::new(pool));
    store.run_migrations().await.unwrap();

    let orchestrator = Arc::new(SupportOrchestrator::new(
        store as Arc<dyn ConversationStore>,
        KnowledgeRetriever::new(Arc::new(NoopEmbedder), Arc::new(EmptyIndex)),
        SignalExtractor::heuristic_only(),
        EscalationPolicy::new(EscalationConfig::default()),
        ResponseGenerator::new(Arc::new(CannedChat), GeneratorConfig::default()),
        Arc::new(NotificationDispatcher::new(Vec::new())),
        OrchestratorConfig::default(),
    ));

    AppState { orchestrator }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn status_reports_ok_with_version_header() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-api-version"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn chat_turn_round_trips_through_the_router() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(post_json(
            "/api/support/chat",
            json!({
                "user_id": "user-1",
                "user_email": "user-1@example.com",
                "message": "How do I reset my password?"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reply"], "Happy to help.");
    assert_eq!(body["intent"]["label"], "account_management");
    assert_eq!(body["escalated"], false);
    assert!(body["conversation_id"].as_str().is_some());
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(post_json(
            "/api/support/chat",
            json!({
                "user_id": "user-1",
                "user_email": "user-1@example.com",
                "message": "   "
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_conversation_lookup_is_404() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/support/conversations/nope?user_id=user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_then_lookup_then_analytics() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/support/chat",
            json!({
                "user_id": "user-1",
                "user_email": "user-1@example.com",
                "message": "what fees do you charge on rental analysis?"
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

    let lookup = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/support/conversations/{conversation_id}?user_id=user-1"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(lookup.status(), StatusCode::OK);
    let conversation = body_json(lookup).await;
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);

    let analytics = app
        .oneshot(
            Request::builder()
                .uri("/api/support/analytics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(analytics.status(), StatusCode::OK);
    let analytics = body_json(analytics).await;
    assert_eq!(analytics["total_conversations"], 1);
}

#[tokio::test]
async fn resolve_endpoint_closes_a_conversation() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/support/chat",
            json!({
                "user_id": "user-1",
                "user_email": "user-1@example.com",
                "message": "short question"
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

    let resolve = app
        .oneshot(post_json(
            &format!("/api/support/conversations/{conversation_id}/resolve"),
            json!({ "resolved_by": "agent-1", "notes": "answered" }),
        ))
        .await
        .unwrap();

    assert_eq!(resolve.status(), StatusCode::OK);
    let resolved = body_json(resolve).await;
    assert_eq!(resolved["status"], "resolved");
    assert!(resolved["resolved_at"].as_str().is_some());
}
