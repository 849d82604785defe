//! PostgreSQL chat log over the `chat_session` / `chat_log` tables

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info, instrument};

use medinote_common::{ProviderError, ProviderResult};

use crate::chat_log::{session_title, turn_messages, ChatLog, LoggedTurn, SessionMessage, SessionSummary};

const PROVIDER: &str = "postgres";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS chat_session (
        session_id BIGSERIAL PRIMARY KEY,
        user_id TEXT,
        title VARCHAR(100) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS chat_log (
        chat_id BIGSERIAL PRIMARY KEY,
        session_id BIGINT NOT NULL REFERENCES chat_session(session_id) ON DELETE CASCADE,
        user_id TEXT,
        query TEXT,
        answer TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS chat_log_user_recent_idx ON chat_log (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS chat_session_user_idx ON chat_session (user_id, created_at DESC)",
];

fn db_error(e: sqlx::Error) -> ProviderError {
    ProviderError::transport(PROVIDER, e.to_string())
}

fn as_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone)]
pub struct PgChatLog {
    pool: PgPool,
}

impl PgChatLog {
    pub async fn connect(database_url: &str) -> ProviderResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(db_error)?;
        info!("Connected to chat log database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables when they do not exist yet
    pub async fn ensure_schema(&self) -> ProviderResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await.map_err(db_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChatLog for PgChatLog {
    #[instrument(skip(self))]
    async fn recent_turns(&self, user_id: &str, limit: usize) -> ProviderResult<Vec<LoggedTurn>> {
        let rows: Vec<(i64, Option<String>, Option<String>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT session_id, query, answer, created_at
             FROM chat_log
             WHERE user_id = $1
             ORDER BY created_at DESC, chat_id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(session_id, query, answer, created_at)| LoggedTurn {
                session_id,
                query: query.unwrap_or_default(),
                answer: answer.unwrap_or_default(),
                created_at,
            })
            .collect())
    }

    #[instrument(skip(self, query, answer))]
    async fn record_turn(
        &self,
        session_hint: Option<i64>,
        user_id: Option<&str>,
        query: &str,
        answer: &str,
    ) -> ProviderResult<i64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let existing: Option<i64> = match session_hint.filter(|id| *id > 0) {
            Some(hint) => sqlx::query_scalar(
                "SELECT session_id FROM chat_session
                 WHERE session_id = $1 AND user_id IS NOT DISTINCT FROM $2",
            )
            .bind(hint)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?,
            None => None,
        };

        let session_id = match existing {
            Some(id) => id,
            None => {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO chat_session (user_id, title, created_at)
                     VALUES ($1, $2, NOW())
                     RETURNING session_id",
                )
                .bind(user_id)
                .bind(session_title(query))
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
                debug!(session_id = id, "Opened chat session");
                id
            }
        };

        sqlx::query(
            "INSERT INTO chat_log (session_id, user_id, query, answer, created_at)
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(query)
        .bind(answer)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(session_id)
    }

    #[instrument(skip(self))]
    async fn owns_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM chat_session
                 WHERE session_id = $1 AND user_id IS NOT DISTINCT FROM $2
             )",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn session_messages(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<Option<Vec<SessionMessage>>> {
        let rows: Vec<(Option<String>, Option<String>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT query, answer, created_at
             FROM chat_log
             WHERE session_id = $1 AND ($2::TEXT IS NULL OR user_id = $2)
             ORDER BY created_at ASC, chat_id ASC",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            rows.into_iter()
                .flat_map(|(query, answer, created_at)| {
                    turn_messages(query.unwrap_or_default(), answer.unwrap_or_default(), created_at)
                })
                .collect(),
        ))
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> ProviderResult<Vec<SessionSummary>> {
        let rows: Vec<(i64, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT session_id, title, created_at
             FROM chat_session
             WHERE ($1::TEXT IS NULL OR user_id = $1)
             ORDER BY created_at DESC, session_id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(session_id, title, created_at)| SessionSummary {
                session_id,
                title,
                created_at,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: i64, user_id: Option<&str>) -> ProviderResult<bool> {
        // chat_log rows go with the session through ON DELETE CASCADE
        let result = sqlx::query(
            "DELETE FROM chat_session
             WHERE session_id = $1 AND ($2::TEXT IS NULL OR user_id = $2)",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_all_sessions(&self, user_id: Option<&str>) -> ProviderResult<()> {
        match user_id {
            Some(user_id) => {
                let mut tx = self.pool.begin().await.map_err(db_error)?;
                sqlx::query("DELETE FROM chat_log WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                sqlx::query("DELETE FROM chat_session WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                tx.commit().await.map_err(db_error)?;
            }
            None => {
                sqlx::query("TRUNCATE chat_log, chat_session RESTART IDENTITY CASCADE")
                    .execute(&self.pool)
                    .await
                    .map_err(db_error)?;
            }
        }
        Ok(())
    }
}
