//! Offline providers for driving the HTTP surface end to end

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use medinote_agent_network::prompts::PLANNER_SYSTEM_PROMPT;
use medinote_agent_network::{service_from_deps, AgentDeps};
use medinote_api::{router, AppState};
use medinote_common::{
    CandidatePassage, LanguageModel, Prompt, ProviderError, ProviderResult, SystemConfig,
};
use medinote_history::{
    ChatLog, InMemoryChatLog, LoggedTurn, RecordCategory, SessionMessage, SessionSummary, UserRecordService,
};
use medinote_rag::VectorRetriever;

/// Any question containing this marker makes generation fail
pub const FAILING_MARKER: &str = "고장";

/// Echoes the question back; planner calls get a non-JSON reply.
pub struct EchoLlm;

#[async_trait]
impl LanguageModel for EchoLlm {
    async fn generate(&self, prompt: &Prompt) -> ProviderResult<String> {
        if prompt.system == PLANNER_SYSTEM_PROMPT {
            return Ok("no plan".to_string());
        }
        if prompt.user.contains(FAILING_MARKER) {
            return Err(ProviderError::transport("llm", "connection reset by peer"));
        }
        Ok(format!("답변: {}", prompt.user))
    }
}

pub struct EmptyRetriever;

#[async_trait]
impl VectorRetriever for EmptyRetriever {
    async fn retrieve(&self, _collection: &str, _query: &str, _k: usize) -> ProviderResult<Vec<CandidatePassage>> {
        Ok(Vec::new())
    }
}

pub struct NoRecords;

#[async_trait]
impl UserRecordService for NoRecords {
    async fn fetch(&self, _category: RecordCategory, _user_id: &str) -> ProviderResult<Value> {
        Err(ProviderError::not_configured("records"))
    }
}

pub struct BrokenChatLog;

fn broken() -> ProviderError {
    ProviderError::transport("postgres", "password authentication failed for user \"medinote\"")
}

#[async_trait]
impl ChatLog for BrokenChatLog {
    async fn recent_turns(&self, _user_id: &str, _limit: usize) -> ProviderResult<Vec<LoggedTurn>> {
        Err(broken())
    }

    async fn record_turn(
        &self,
        _session_hint: Option<i64>,
        _user_id: Option<&str>,
        _query: &str,
        _answer: &str,
    ) -> ProviderResult<i64> {
        Err(broken())
    }

    async fn session_messages(&self, _session_id: i64, _user_id: Option<&str>) -> ProviderResult<Option<Vec<SessionMessage>>> {
        Err(broken())
    }

    async fn list_sessions(&self, _user_id: Option<&str>, _limit: usize) -> ProviderResult<Vec<SessionSummary>> {
        Err(broken())
    }

    async fn owns_session(&self, _session_id: i64, _user_id: Option<&str>) -> ProviderResult<bool> {
        Err(broken())
    }

    async fn delete_session(&self, _session_id: i64, _user_id: Option<&str>) -> ProviderResult<bool> {
        Err(broken())
    }

    async fn delete_all_sessions(&self, _user_id: Option<&str>) -> ProviderResult<()> {
        Err(broken())
    }
}

pub fn app_with_log(chat_log: Arc<dyn ChatLog>) -> Router {
    let deps = AgentDeps {
        llm: Arc::new(EchoLlm),
        retriever: Arc::new(EmptyRetriever),
        reranker: None,
        web: None,
        records: Arc::new(NoRecords),
        chat_log,
    };
    let service = service_from_deps(&deps, &SystemConfig::default());
    router(AppState::new(service))
}

pub fn app() -> Router {
    app_with_log(Arc::new(InMemoryChatLog::new()))
}

/// Send one request and decode the JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn query(user_id: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post("/chatbot/query").header("content-type", "application/json");
    if let Some(user) = user_id {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(user) = user_id {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(uri);
    if let Some(user) = user_id {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}
