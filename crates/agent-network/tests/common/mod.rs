//! Fakes for every provider the agents use. Each fake records its calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::Value;

use medinote_agent_network::prompts::PLANNER_SYSTEM_PROMPT;
use medinote_agent_network::{service_from_deps, AgentDeps, ChatService, Orchestrator};
use medinote_common::{
    CandidatePassage, ConversationState, LanguageModel, Prompt, ProviderError, ProviderResult, SystemConfig,
    WebResult,
};
use medinote_history::{ChatLog, InMemoryChatLog, RecordCategory, UserRecordService};
use medinote_rag::{PassageReranker, RerankHit, VectorRetriever, WebSearch};

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

// ============================================================================
// Language model
// ============================================================================

/// Language model with a scripted planner reply and per-prompt answers.
///
/// Agent answers are matched by a substring of the system prompt; the first
/// matching rule wins and unmatched prompts get the default answer.
pub struct ScriptedLlm {
    plan: ProviderResult<String>,
    answers: Vec<(String, ProviderResult<String>)>,
    default_answer: String,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    /// Planner unavailable, every agent answers "기본 답변"
    pub fn new() -> Self {
        Self {
            plan: Err(ProviderError::not_configured("planner")),
            answers: Vec::new(),
            default_answer: "기본 답변".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plan(mut self, raw: &str) -> Self {
        self.plan = Ok(raw.to_string());
        self
    }

    pub fn with_answer(mut self, system_contains: &str, answer: &str) -> Self {
        self.answers.push((system_contains.to_string(), Ok(answer.to_string())));
        self
    }

    pub fn failing_on(mut self, system_contains: &str) -> Self {
        self.answers.push((
            system_contains.to_string(),
            Err(ProviderError::http("openai", 503, "overloaded")),
        ));
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn planner_calls(&self) -> Vec<Prompt> {
        self.prompts().into_iter().filter(is_planner).collect()
    }

    /// Generation requests made by agents
    pub fn agent_calls(&self) -> Vec<Prompt> {
        self.prompts().into_iter().filter(|p| !is_planner(p)).collect()
    }
}

fn is_planner(prompt: &Prompt) -> bool {
    prompt.system == PLANNER_SYSTEM_PROMPT
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn generate(&self, prompt: &Prompt) -> ProviderResult<String> {
        self.prompts.lock().unwrap().push(prompt.clone());

        if is_planner(prompt) {
            return self.plan.clone();
        }
        self.answers
            .iter()
            .find(|(needle, _)| prompt.system.contains(needle.as_str()))
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(|| Ok(self.default_answer.clone()))
    }
}

// ============================================================================
// Retrieval
// ============================================================================

#[derive(Default)]
pub struct FakeRetriever {
    collections: HashMap<String, Vec<CandidatePassage>>,
    failing: Vec<String>,
    calls: Mutex<Vec<(String, String, usize)>>,
}

impl FakeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, texts: &[&str]) -> Self {
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, t)| CandidatePassage::new(*t).with_url(format!("https://{name}.example/{i}")))
            .collect();
        self.collections.insert(name.to_string(), passages);
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    /// (collection, query, k) per call
    pub fn calls(&self) -> Vec<(String, String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorRetriever for FakeRetriever {
    async fn retrieve(&self, collection: &str, query: &str, k: usize) -> ProviderResult<Vec<CandidatePassage>> {
        self.calls
            .lock()
            .unwrap()
            .push((collection.to_string(), query.to_string(), k));

        if self.failing.iter().any(|c| c == collection) {
            return Err(ProviderError::transport("qdrant", "connection refused"));
        }
        let mut passages = self.collections.get(collection).cloned().unwrap_or_default();
        passages.truncate(k);
        Ok(passages)
    }
}

/// Reranker that assigns fixed scores to the pool in order
pub struct FakeReranker {
    scores: ProviderResult<Vec<f64>>,
    calls: Mutex<Vec<usize>>,
}

impl FakeReranker {
    pub fn scoring(scores: &[f64]) -> Self {
        Self {
            scores: Ok(scores.to_vec()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            scores: Err(ProviderError::http("cohere", 500, "boom")),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pool size per call
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PassageReranker for FakeReranker {
    async fn rerank(&self, _query: &str, texts: &[String], top_k: usize) -> ProviderResult<Vec<RerankHit>> {
        self.calls.lock().unwrap().push(texts.len());
        let scores = self.scores.clone()?;
        Ok(scores
            .into_iter()
            .enumerate()
            .take(texts.len().min(top_k))
            .map(|(index, score)| RerankHit {
                index,
                score: Some(score),
            })
            .collect())
    }
}

// ============================================================================
// Web search
// ============================================================================

#[derive(Default)]
pub struct FakeWeb {
    results: Vec<WebResult>,
    fail: bool,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeWeb {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_results(count: usize) -> Self {
        let results = (1..=count)
            .map(|i| WebResult {
                title: Some(format!("웹 문서 {i}")),
                url: Some(format!("https://web.example/{i}")),
                snippet: Some(format!("웹 요약 {i}")),
                score: None,
            })
            .collect();
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// (query, top_k) per call
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for FakeWeb {
    async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<WebResult>> {
        self.calls.lock().unwrap().push((query.to_string(), top_k));
        if self.fail {
            return Err(ProviderError::transport("searxng", "timed out"));
        }
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

// ============================================================================
// Personal records
// ============================================================================

#[derive(Default)]
pub struct FakeRecords {
    values: HashMap<RecordCategory, Value>,
    failing: Option<RecordCategory>,
    calls: Mutex<Vec<(RecordCategory, String)>>,
}

impl FakeRecords {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: RecordCategory, value: Value) -> Self {
        self.values.insert(category, value);
        self
    }

    pub fn failing_on(mut self, category: RecordCategory) -> Self {
        self.failing = Some(category);
        self
    }

    pub fn calls(&self) -> Vec<(RecordCategory, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRecordService for FakeRecords {
    async fn fetch(&self, category: RecordCategory, user_id: &str) -> ProviderResult<Value> {
        self.calls.lock().unwrap().push((category, user_id.to_string()));
        if self.failing == Some(category) {
            return Err(ProviderError::http("records", 500, "internal error: db password=hunter2"));
        }
        Ok(self.values.get(&category).cloned().unwrap_or(Value::Null))
    }
}

// ============================================================================
// Chat log that cannot be written
// ============================================================================

pub struct BrokenChatLog;

fn broken() -> ProviderError {
    ProviderError::transport("postgres", "connection reset")
}

#[async_trait]
impl ChatLog for BrokenChatLog {
    async fn recent_turns(&self, _user_id: &str, _limit: usize) -> ProviderResult<Vec<medinote_history::LoggedTurn>> {
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

    async fn session_messages(
        &self,
        _session_id: i64,
        _user_id: Option<&str>,
    ) -> ProviderResult<Option<Vec<medinote_history::SessionMessage>>> {
        Err(broken())
    }

    async fn list_sessions(
        &self,
        _user_id: Option<&str>,
        _limit: usize,
    ) -> ProviderResult<Vec<medinote_history::SessionSummary>> {
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

// ============================================================================
// Harness
// ============================================================================

/// Handles to every fake, kept so tests can inspect calls after a turn
pub struct Harness {
    pub llm: Arc<ScriptedLlm>,
    pub retriever: Arc<FakeRetriever>,
    pub reranker: Option<Arc<FakeReranker>>,
    pub web: Arc<FakeWeb>,
    pub records: Arc<FakeRecords>,
    pub chat_log: Arc<dyn ChatLog>,
    pub config: SystemConfig,
}

impl Harness {
    /// Empty retrieval, no reranker, no web results, no records, in-memory chat log
    pub fn new(llm: ScriptedLlm) -> Self {
        init_test_logging();
        Self {
            llm: Arc::new(llm),
            retriever: Arc::new(FakeRetriever::new()),
            reranker: None,
            web: Arc::new(FakeWeb::empty()),
            records: Arc::new(FakeRecords::empty()),
            chat_log: Arc::new(InMemoryChatLog::new()),
            config: SystemConfig::default(),
        }
    }

    pub fn deps(&self) -> AgentDeps {
        AgentDeps {
            llm: self.llm.clone(),
            retriever: self.retriever.clone(),
            reranker: self.reranker.clone().map(|r| r as Arc<dyn PassageReranker>),
            web: Some(self.web.clone() as Arc<dyn WebSearch>),
            records: self.records.clone(),
            chat_log: self.chat_log.clone(),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::from_deps(&self.deps(), &self.config)
    }

    pub fn service(&self) -> ChatService {
        service_from_deps(&self.deps(), &self.config)
    }
}

pub fn turn(user_id: Option<&str>, text: &str) -> ConversationState {
    ConversationState::new_turn(user_id.map(String::from), None, text)
}
