//! HTTP handlers for the support API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use tracing::error;

use super::types::{
    API_VERSION, AssignRequest, ChatTurnRequest, ConversationQuery, ErrorResponse, ResolveRequest,
    USER_FACING_ERROR,
};
use crate::TurnError;
use crate::orchestrator::TurnRequest;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Log the real failure, hand the caller the generic retry message.
fn turn_error(err: TurnError) -> ApiError {
    error!("{err}");
    let status = match err {
        TurnError::Generation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: USER_FACING_ERROR.to_string(),
        }),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Conversation not found".to_string(),
        }),
    )
}

/// Health check and status endpoint
pub async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "api_version": API_VERSION,
    }))
}

/// One support turn: message in, grounded reply and escalation state out.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatTurnRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.message.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "Message must not be empty".to_string(),
            }),
        ));
    }

    let outcome = state
        .orchestrator
        .handle_turn(TurnRequest {
            conversation_id: request.conversation_id,
            user_id: request.user_id,
            user_email: request.user_email,
            message: request.message,
        })
        .await
        .map_err(turn_error)?;

    Ok(Json(serde_json::to_value(outcome).unwrap_or_default()))
}

pub async fn conversation_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Value>, ApiError> {
    let conversation = state
        .orchestrator
        .conversation(&conversation_id, &query.user_id)
        .await
        .map_err(turn_error)?
        .ok_or_else(not_found)?;

    Ok(Json(serde_json::to_value(conversation).unwrap_or_default()))
}

pub async fn assign_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<Value>, ApiError> {
    let conversation = state
        .orchestrator
        .assign(&conversation_id, &request.agent)
        .await
        .map_err(turn_error)?;

    Ok(Json(json!({
        "conversation_id": conversation.conversation_id,
        "status": conversation.status,
        "assigned_to": conversation.assigned_to,
    })))
}

pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<Value>, ApiError> {
    let conversation = state
        .orchestrator
        .resolve(&conversation_id, &request.resolved_by, request.notes.as_deref())
        .await
        .map_err(turn_error)?;

    Ok(Json(json!({
        "conversation_id": conversation.conversation_id,
        "status": conversation.status,
        "resolved_at": conversation.resolved_at,
        "resolved_by": conversation.resolved_by,
    })))
}

/// Read-only aggregation surface for analytics observers.
pub async fn analytics_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summaries = state.orchestrator.summaries().await.map_err(turn_error)?;

    let escalated = summaries.iter().filter(|s| s.escalated).count();
    let resolved = summaries
        .iter()
        .filter(|s| s.resolved_at.is_some())
        .count();

    Ok(Json(json!({
        "total_conversations": summaries.len(),
        "escalated": escalated,
        "resolved": resolved,
        "conversations": summaries,
    })))
}
