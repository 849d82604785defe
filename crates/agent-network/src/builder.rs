//! Wires the concrete providers named in a [`SystemConfig`] into a turn service

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use medinote_common::{OpenAiChatClient, SystemConfig};
use medinote_history::{BackendRecordClient, ChatLog, InMemoryChatLog, PgChatLog};
use medinote_rag::{CohereReranker, PassageReranker, QdrantRetriever, SearXNGClient, WebSearch};

use crate::agents::AgentDeps;
use crate::orchestrator::Orchestrator;
use crate::service::ChatService;

/// Provider clients for every agent. The chat log connects to PostgreSQL when a
/// database URL is configured and stays in memory otherwise.
pub async fn build_deps(config: &SystemConfig) -> Result<AgentDeps> {
    let llm = OpenAiChatClient::new(&config.llm).context("Failed to create language model client")?;
    let retriever = QdrantRetriever::new(&config.retrieval).context("Failed to create vector retriever")?;

    let reranker = CohereReranker::from_config(&config.rerank)
        .context("Failed to create reranker")?
        .map(|r| Arc::new(r) as Arc<dyn PassageReranker>);
    if reranker.is_none() {
        info!("No rerank API key, passages keep retrieval order");
    }

    let web = SearXNGClient::from_config(&config.web_search)
        .context("Failed to create web search client")?
        .map(|w| Arc::new(w) as Arc<dyn WebSearch>);
    if web.is_none() {
        info!("No web search endpoint, web results disabled");
    }

    let records = BackendRecordClient::new(&config.records).context("Failed to create record client")?;
    let chat_log = build_chat_log(config).await?;

    Ok(AgentDeps {
        llm: Arc::new(llm),
        retriever: Arc::new(retriever),
        reranker,
        web,
        records: Arc::new(records),
        chat_log,
    })
}

async fn build_chat_log(config: &SystemConfig) -> Result<Arc<dyn ChatLog>> {
    match &config.history.database_url {
        Some(url) => {
            let log = PgChatLog::connect(url).await.context("Failed to connect to chat database")?;
            log.ensure_schema().await.context("Failed to prepare chat tables")?;
            info!("Chat log stored in PostgreSQL");
            Ok(Arc::new(log))
        }
        None => {
            info!("No database configured, chat log kept in memory");
            Ok(Arc::new(InMemoryChatLog::new()))
        }
    }
}

pub async fn build_service(config: &SystemConfig) -> Result<ChatService> {
    let deps = build_deps(config).await?;
    Ok(service_from_deps(&deps, config))
}

/// Turn service over already constructed providers
pub fn service_from_deps(deps: &AgentDeps, config: &SystemConfig) -> ChatService {
    ChatService::new(
        Orchestrator::from_deps(deps, config),
        deps.chat_log.clone(),
        config.history.session_context_messages,
    )
}
