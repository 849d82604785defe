//! Domain agents
//!
//! Each agent takes the turn state by value, answers the newest user message and
//! hands the state back with its reply appended. Answer and sources of a later
//! agent replace those of an earlier one.

pub mod chit;
pub mod history;
pub mod knowledge;
pub mod pool;
pub mod records;
pub mod web;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use medinote_common::{ChatbotError, ChatbotResult, ConversationState, LanguageModel, Meta, Prompt, RouteName};
use medinote_history::{ChatLog, UserRecordService};
use medinote_rag::{PassageReranker, VectorRetriever, WebSearch};

pub use chit::ChitAgent;
pub use history::HistoryAgent;
pub use knowledge::{KnowledgeAgent, KnowledgeSettings};
pub use pool::AgentPool;
pub use records::RecordsAgent;
pub use web::WebAgent;

#[async_trait]
pub trait DomainAgent: Send + Sync {
    fn route(&self) -> RouteName;

    /// Answer the newest user message. Only a language-model failure is an error.
    async fn run(&self, state: ConversationState) -> ChatbotResult<ConversationState>;
}

/// Provider handles shared by the agents
#[derive(Clone)]
pub struct AgentDeps {
    pub llm: Arc<dyn LanguageModel>,
    pub retriever: Arc<dyn VectorRetriever>,
    pub reranker: Option<Arc<dyn PassageReranker>>,
    pub web: Option<Arc<dyn WebSearch>>,
    pub records: Arc<dyn UserRecordService>,
    pub chat_log: Arc<dyn ChatLog>,
}

pub(crate) async fn generate(llm: &dyn LanguageModel, prompt: Prompt) -> ChatbotResult<String> {
    llm.generate(&prompt).await.map_err(ChatbotError::Generation)
}

/// Diagnostic bag seeded with the agent name
pub(crate) fn agent_meta(route: RouteName) -> Meta {
    let mut meta = Meta::new();
    meta.insert("agent".into(), Value::String(format!("{route}_agent")));
    meta
}
