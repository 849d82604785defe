//! Retrieval-augmented agents over the disease and drug collections
//!
//! Both agents share one pipeline and differ only in their collections and
//! prompt:
//!
//! 1. gather a candidate pool from the domain and interaction collections
//! 2. rerank it and keep the top passages
//! 3. score the kept passages and band the score into a reliability level
//! 4. supplement low-confidence (or empty) local context with web results
//! 5. generate with a system prompt templated with the score

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use medinote_common::{
    truncate_chars, ChatbotResult, ConversationState, LanguageModel, Prompt, RankedPassage, RetrievalConfig,
    RouteName, SourceRecord, SystemConfig,
};
use medinote_rag::{gather_pool, rerank_passages, ConfidenceThresholds, PassageReranker, Reliability, VectorRetriever, WebSearch};

use super::web::{search_or_empty, web_context, web_sources};
use super::{agent_meta, generate, AgentDeps, DomainAgent};
use crate::prompts::knowledge_system_prompt;

const TITLE_CHARS: usize = 60;

/// Retrieval sizes and thresholds for one agent
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeSettings {
    pub pool_size: usize,
    pub top_k: usize,
    pub rescue_results: usize,
    pub thresholds: ConfidenceThresholds,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            pool_size: 50,
            top_k: 5,
            rescue_results: 3,
            thresholds: ConfidenceThresholds::default(),
        }
    }
}

impl From<&SystemConfig> for KnowledgeSettings {
    fn from(config: &SystemConfig) -> Self {
        Self {
            pool_size: config.retrieval.pool_size,
            top_k: config.retrieval.top_k,
            rescue_results: config.web_search.rescue_results,
            thresholds: ConfidenceThresholds::from(&config.confidence),
        }
    }
}

pub struct KnowledgeAgent {
    route: RouteName,
    collections: Vec<String>,
    settings: KnowledgeSettings,
    llm: Arc<dyn LanguageModel>,
    retriever: Arc<dyn VectorRetriever>,
    reranker: Option<Arc<dyn PassageReranker>>,
    web: Option<Arc<dyn WebSearch>>,
}

impl KnowledgeAgent {
    pub fn disease(deps: &AgentDeps, retrieval: &RetrievalConfig, settings: KnowledgeSettings) -> Self {
        Self::new(
            RouteName::Disease,
            vec![retrieval.disease_collection.clone(), retrieval.interaction_collection.clone()],
            settings,
            deps,
        )
    }

    pub fn drug(deps: &AgentDeps, retrieval: &RetrievalConfig, settings: KnowledgeSettings) -> Self {
        Self::new(
            RouteName::Drug,
            vec![retrieval.drug_collection.clone(), retrieval.interaction_collection.clone()],
            settings,
            deps,
        )
    }

    fn new(route: RouteName, collections: Vec<String>, settings: KnowledgeSettings, deps: &AgentDeps) -> Self {
        Self {
            route,
            collections,
            settings,
            llm: deps.llm.clone(),
            retriever: deps.retriever.clone(),
            reranker: deps.reranker.clone(),
            web: deps.web.clone(),
        }
    }

    /// Kept passages with their confidence and reliability
    async fn rank(&self, question: &str) -> (Vec<RankedPassage>, f64, Reliability) {
        let collections: Vec<&str> = self.collections.iter().map(String::as_str).collect();
        let pool = gather_pool(self.retriever.as_ref(), &collections, question, self.settings.pool_size).await;

        if pool.is_empty() {
            info!("Empty candidate pool");
            return (Vec::new(), 0.0, Reliability::Low);
        }

        let ranked = rerank_passages(self.reranker.as_deref(), question, &pool, self.settings.top_k).await;
        let thresholds = &self.settings.thresholds;
        let confidence = thresholds.score(&ranked);
        (ranked, confidence, thresholds.classify(confidence))
    }
}

#[async_trait]
impl DomainAgent for KnowledgeAgent {
    fn route(&self) -> RouteName {
        self.route
    }

    #[instrument(name = "knowledge_agent", skip_all, fields(route = %self.route))]
    async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let question = state.latest_user_text().to_string();
        let (ranked, confidence, reliability) = self.rank(&question).await;

        let used_local = !ranked.is_empty();
        let web_fallback = !used_local || self.settings.thresholds.needs_web_rescue(confidence);

        let mut blocks = Vec::new();
        let mut sources = Vec::new();
        if used_local {
            blocks.push(passage_context(&ranked));
            sources.extend(passage_sources(self.route, &ranked));
        }

        let mut web_results = 0;
        if web_fallback {
            let results = search_or_empty(self.web.as_deref(), &question, self.settings.rescue_results).await;
            web_results = results.len();
            if !results.is_empty() {
                blocks.push(web_context(&results));
                sources.extend(web_sources(&results));
            }
        }

        info!(
            confidence,
            reliability = %reliability,
            web_fallback,
            kept_docs = ranked.len(),
            web_results,
            "Retrieval finished"
        );

        let mut meta = agent_meta(self.route);
        meta.insert("confidence".into(), Value::from(confidence));
        meta.insert("reliability".into(), Value::String(reliability.to_string()));
        meta.insert("web_fallback".into(), Value::Bool(web_fallback));
        meta.insert("used_local".into(), Value::Bool(used_local));
        meta.insert("kept_docs".into(), ranked.len().into());
        meta.insert("web_results".into(), web_results.into());

        let context = (!blocks.is_empty()).then(|| blocks.join("\n\n"));
        let prompt = Prompt::new(knowledge_system_prompt(self.route, confidence, reliability), question)
            .with_context(context)
            .with_conversation(state.earlier_turns());
        let answer = generate(self.llm.as_ref(), prompt).await?;

        state.push_reply(answer, sources, meta);
        Ok(state)
    }
}

/// First line of a passage, cut to 60 characters
pub fn passage_title(text: &str) -> Option<String> {
    let first_line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    Some(truncate_chars(first_line, TITLE_CHARS))
}

fn passage_context(ranked: &[RankedPassage]) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[문서 {}] {}", i + 1, p.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn passage_sources(route: RouteName, ranked: &[RankedPassage]) -> Vec<SourceRecord> {
    ranked
        .iter()
        .map(|p| SourceRecord {
            id: format!("{route}-{}", p.original_index),
            collection: route.to_string(),
            title: passage_title(&p.text),
            url: p.detail_url.clone(),
            score: p.score,
        })
        .collect()
}
