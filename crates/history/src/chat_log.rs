use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medinote_common::{truncate_chars, ProviderResult, Role};

const MAX_TITLE_CHARS: usize = 50;
const DEFAULT_TITLE: &str = "새로운 채팅";

/// One persisted question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedTurn {
    pub session_id: i64,
    pub query: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted chat sessions and their turns.
///
/// `user_id` filters are optional: `None` means "any user". Session ownership
/// is the exception: see [`ChatLog::owns_session`].
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Latest turns of a user across all sessions, newest first
    async fn recent_turns(&self, user_id: &str, limit: usize) -> ProviderResult<Vec<LoggedTurn>>;

    /// Append a turn and return the session it landed in.
    ///
    /// A missing, non-positive or unknown `session_hint` opens a new session titled after the query.
    async fn record_turn(
        &self,
        session_hint: Option<i64>,
        user_id: Option<&str>,
        query: &str,
        answer: &str,
    ) -> ProviderResult<i64>;

    /// Whether the session exists and belongs to exactly `user_id`.
    ///
    /// `None` owns only anonymous sessions. `record_turn` reuses a hinted session
    /// under the same rule.
    async fn owns_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool>;

    /// Messages of a session as user/assistant pairs, oldest first. `None` when the session has no turns.
    async fn session_messages(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<Option<Vec<SessionMessage>>>;

    /// Sessions, newest first
    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> ProviderResult<Vec<SessionSummary>>;

    async fn delete_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool>;

    async fn delete_all_sessions(&self, user_id: Option<&str>) -> ProviderResult<()>;
}

/// Session title derived from the first query of the session
pub fn session_title(query: &str) -> String {
    let title = query.trim();
    if title.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        format!("{}...", truncate_chars(title, MAX_TITLE_CHARS - 3))
    } else {
        title.to_string()
    }
}

/// Expand a turn into its user and assistant messages
pub(crate) fn turn_messages(query: String, answer: String, created_at: DateTime<Utc>) -> [SessionMessage; 2] {
    [
        SessionMessage {
            role: Role::User,
            content: query,
            created_at,
        },
        SessionMessage {
            role: Role::Assistant,
            content: answer,
            created_at,
        },
    ]
}
