//! Request and response bodies of the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medinote_common::{Role, SourceRecord};
use medinote_history::{SessionMessage, SessionSummary};

/// Body of `POST /chatbot/query`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatQueryRequest {
    /// `0` (or absent) starts a new session
    #[serde(default)]
    pub session_id: i64,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatQueryResponse {
    pub session_id: i64,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionItem {
    pub session_id: i64,
    pub title: String,
    pub created_at: String,
}

impl From<SessionSummary> for SessionItem {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id,
            title: summary.title,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageItem {
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

impl From<SessionMessage> for MessageItem {
    fn from(message: SessionMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetailResponse {
    pub session_id: i64,
    pub messages: Vec<MessageItem>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,

    /// Optional additional information
    pub message: Option<String>,

    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable, safe to show to end users
    pub error: String,

    /// Machine readable code
    pub code: Option<String>,

    pub timestamp: DateTime<Utc>,
}
