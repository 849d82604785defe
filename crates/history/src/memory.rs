//! In-process chat log, used when no database is configured and in tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use medinote_common::ProviderResult;

use crate::chat_log::{session_title, turn_messages, ChatLog, LoggedTurn, SessionMessage, SessionSummary};

#[derive(Debug, Clone)]
struct SessionRow {
    session_id: i64,
    user_id: Option<String>,
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LogRow {
    session_id: i64,
    user_id: Option<String>,
    query: String,
    answer: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    last_session_id: i64,
    sessions: Vec<SessionRow>,
    logs: Vec<LogRow>,
}

#[derive(Debug, Default)]
pub struct InMemoryChatLog {
    inner: RwLock<Inner>,
}

fn user_matches(row_user: &Option<String>, filter: Option<&str>) -> bool {
    filter.map_or(true, |user| row_user.as_deref() == Some(user))
}

impl Inner {
    fn owns(&self, session_id: i64, user_id: Option<&str>) -> bool {
        self.sessions
            .iter()
            .any(|s| s.session_id == session_id && s.user_id.as_deref() == user_id)
    }
}

impl InMemoryChatLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatLog for InMemoryChatLog {
    async fn recent_turns(&self, user_id: &str, limit: usize) -> ProviderResult<Vec<LoggedTurn>> {
        let inner = self.inner.read().await;
        // logs are appended in time order, so reverse iteration is newest first
        Ok(inner
            .logs
            .iter()
            .rev()
            .filter(|row| row.user_id.as_deref() == Some(user_id))
            .take(limit)
            .map(|row| LoggedTurn {
                session_id: row.session_id,
                query: row.query.clone(),
                answer: row.answer.clone(),
                created_at: row.created_at,
            })
            .collect())
    }

    async fn record_turn(
        &self,
        session_hint: Option<i64>,
        user_id: Option<&str>,
        query: &str,
        answer: &str,
    ) -> ProviderResult<i64> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let existing = session_hint
            .filter(|id| *id > 0)
            .filter(|id| inner.owns(*id, user_id));
        let user_id = user_id.map(str::to_string);

        let session_id = match existing {
            Some(id) => id,
            None => {
                inner.last_session_id += 1;
                let id = inner.last_session_id;
                inner.sessions.push(SessionRow {
                    session_id: id,
                    user_id: user_id.clone(),
                    title: session_title(query),
                    created_at: now,
                });
                debug!(session_id = id, "Opened chat session");
                id
            }
        };

        inner.logs.push(LogRow {
            session_id,
            user_id,
            query: query.to_string(),
            answer: answer.to_string(),
            created_at: now,
        });
        Ok(session_id)
    }

    async fn owns_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool> {
        Ok(self.inner.read().await.owns(session_id, user_id))
    }

    async fn session_messages(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<Option<Vec<SessionMessage>>> {
        let inner = self.inner.read().await;
        let messages: Vec<SessionMessage> = inner
            .logs
            .iter()
            .filter(|row| row.session_id == session_id && user_matches(&row.user_id, user_id))
            .flat_map(|row| turn_messages(row.query.clone(), row.answer.clone(), row.created_at))
            .collect();

        Ok((!messages.is_empty()).then_some(messages))
    }

    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> ProviderResult<Vec<SessionSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .iter()
            .rev()
            .filter(|s| user_matches(&s.user_id, user_id))
            .take(limit)
            .map(|s| SessionSummary {
                session_id: s.session_id,
                title: s.title.clone(),
                created_at: s.created_at,
            })
            .collect())
    }

    async fn delete_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|s| !(s.session_id == session_id && user_matches(&s.user_id, user_id)));
        let deleted = inner.sessions.len() < before;
        if deleted {
            inner.logs.retain(|row| row.session_id != session_id);
        }
        Ok(deleted)
    }

    async fn delete_all_sessions(&self, user_id: Option<&str>) -> ProviderResult<()> {
        let mut inner = self.inner.write().await;
        match user_id {
            Some(_) => {
                inner.sessions.retain(|s| !user_matches(&s.user_id, user_id));
                inner.logs.retain(|row| !user_matches(&row.user_id, user_id));
            }
            None => *inner = Inner::default(),
        }
        Ok(())
    }
}
