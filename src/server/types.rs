//! Request/response types for the support HTTP API.

use serde::{Deserialize, Serialize};

/// API version for capability detection
pub const API_VERSION: &str = "2026.8.1";

/// Generic message shown for failed turns. Internal error detail stays in
/// the logs, never in the response body.
pub const USER_FACING_ERROR: &str =
    "Something went wrong on our side. Please try sending your message again.";

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub user_id: String,
    pub user_email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub agent: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
