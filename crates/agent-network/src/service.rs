//! Turn service: one user message in, one persisted answer out

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use medinote_common::{ChatbotError, ChatbotResult, ConversationState, Message, Role, SourceRecord};
use medinote_history::ChatLog;

use crate::orchestrator::Orchestrator;

pub const UNAVAILABLE_MESSAGE: &str =
    "죄송합니다. 현재 챗봇 엔진에 문제가 발생하여 답변을 생성할 수 없습니다. 잠시 후 다시 시도해 주세요.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Session to continue; `None` or a non-positive id opens a new one
    pub session_id: Option<i64>,
    pub user_id: Option<String>,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub session_id: i64,
    pub answer: String,
    pub sources: Vec<SourceRecord>,
    /// Message log after the turn, including the reloaded session context
    pub messages: Vec<Message>,
}

pub struct ChatService {
    orchestrator: Orchestrator,
    chat_log: Arc<dyn ChatLog>,
    session_context_messages: usize,
}

impl ChatService {
    pub fn new(orchestrator: Orchestrator, chat_log: Arc<dyn ChatLog>, session_context_messages: usize) -> Self {
        Self {
            orchestrator,
            chat_log,
            session_context_messages,
        }
    }

    pub fn chat_log(&self) -> &Arc<dyn ChatLog> {
        &self.chat_log
    }

    /// Answer one turn and persist it.
    ///
    /// An orchestration failure yields the fixed unavailable reply and persists
    /// nothing. Only a failure to persist a successful turn is an error.
    #[instrument(skip_all, fields(session_id = ?request.session_id, user_id = ?request.user_id))]
    pub async fn handle_turn(&self, request: TurnRequest) -> ChatbotResult<TurnResponse> {
        let TurnRequest {
            session_id,
            user_id,
            query,
        } = request;
        let hint = match session_id.filter(|id| *id > 0) {
            Some(id) => self.owned_session(id, user_id.as_deref()).await,
            None => None,
        };

        let history = match hint {
            Some(id) => self.session_context(id, user_id.as_deref()).await,
            None => Vec::new(),
        };
        let state = ConversationState::with_history(user_id.clone(), hint, history, query.clone());
        let seed_messages = state.messages.clone();

        let state = match self.orchestrator.run(state).await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Turn failed, nothing persisted");
                return Ok(TurnResponse {
                    session_id: hint.unwrap_or(0),
                    answer: UNAVAILABLE_MESSAGE.to_string(),
                    sources: Vec::new(),
                    messages: seed_messages,
                });
            }
        };

        let answer = state.answer.unwrap_or_default();
        let session_id = self
            .chat_log
            .record_turn(hint, user_id.as_deref(), &query, &answer)
            .await
            .map_err(ChatbotError::Persistence)?;

        info!(session_id, route = ?state.route, sources = state.sources.len(), "Turn answered");
        Ok(TurnResponse {
            session_id,
            answer,
            sources: state.sources,
            messages: state.messages,
        })
    }

    /// The hinted session when the caller owns it. Unknown, foreign and
    /// unverifiable sessions yield `None`, so the turn opens a new session.
    async fn owned_session(&self, session_id: i64, user_id: Option<&str>) -> Option<i64> {
        match self.chat_log.owns_session(session_id, user_id).await {
            Ok(true) => Some(session_id),
            Ok(false) => {
                debug!(session_id, "Session hint not owned by caller, opening a new session");
                None
            }
            Err(e) => {
                warn!(session_id, error = %e, "Checking session ownership failed");
                None
            }
        }
    }

    /// Latest messages of the owned session, oldest first. Lookup failures yield no context.
    async fn session_context(&self, session_id: i64, user_id: Option<&str>) -> Vec<Message> {
        let messages = match self.chat_log.session_messages(session_id, user_id).await {
            Ok(Some(messages)) => messages,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(session_id, error = %e, "Loading session context failed");
                return Vec::new();
            }
        };

        let skip = messages.len().saturating_sub(self.session_context_messages);
        messages
            .into_iter()
            .skip(skip)
            .map(|m| match m.role {
                Role::User => Message::user(m.content),
                Role::Assistant => Message::assistant(m.content, Default::default()),
            })
            .collect()
    }
}
