use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, loaded from TOML. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_disease_collection")]
    pub disease_collection: String,
    #[serde(default = "default_drug_collection")]
    pub drug_collection: String,
    #[serde(default = "default_interaction_collection")]
    pub interaction_collection: String,
    #[serde(default = "default_text_field")]
    pub text_field: String,
    #[serde(default = "default_url_field")]
    pub url_field: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    #[serde(default = "default_rerank_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_rerank_model")]
    pub model: String,
    /// Falls back to `COHERE_API_KEY`; no key means passthrough ranking
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_rerank_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// SearXNG base URL; web search is disabled when absent
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_web_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_engines")]
    pub engines: Vec<String>,
    #[serde(default = "default_rescue_results")]
    pub rescue_results: usize,
    #[serde(default = "default_web_agent_results")]
    pub web_agent_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_web_rescue_threshold")]
    pub web_rescue_threshold: f64,
    #[serde(default = "default_scored_window")]
    pub scored_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_records_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// PostgreSQL URL; an in-memory log is used when absent
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_recent_turns")]
    pub recent_turns: usize,
    #[serde(default = "default_session_context_messages")]
    pub session_context_messages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "bge-m3".to_string()
}

fn default_disease_collection() -> String {
    "disease".to_string()
}

fn default_drug_collection() -> String {
    "drug".to_string()
}

fn default_interaction_collection() -> String {
    "interaction".to_string()
}

fn default_text_field() -> String {
    "text".to_string()
}

fn default_url_field() -> String {
    "detail_url".to_string()
}

fn default_pool_size() -> usize {
    50
}

fn default_top_k() -> usize {
    5
}

fn default_retrieval_timeout() -> u64 {
    30
}

fn default_rerank_endpoint() -> String {
    "https://api.cohere.com".to_string()
}

fn default_rerank_model() -> String {
    "rerank-multilingual-v3.0".to_string()
}

fn default_rerank_timeout() -> u64 {
    30
}

fn default_web_timeout() -> u64 {
    10
}

fn default_engines() -> Vec<String> {
    vec!["google".to_string(), "bing".to_string(), "duckduckgo".to_string()]
}

fn default_rescue_results() -> usize {
    3
}

fn default_web_agent_results() -> usize {
    5
}

fn default_medium_threshold() -> f64 {
    0.4
}

fn default_high_threshold() -> f64 {
    0.6
}

fn default_web_rescue_threshold() -> f64 {
    0.15
}

fn default_scored_window() -> usize {
    3
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_records_timeout() -> u64 {
    5
}

fn default_recent_turns() -> usize {
    20
}

fn default_session_context_messages() -> usize {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            ollama_url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            disease_collection: default_disease_collection(),
            drug_collection: default_drug_collection(),
            interaction_collection: default_interaction_collection(),
            text_field: default_text_field(),
            url_field: default_url_field(),
            pool_size: default_pool_size(),
            top_k: default_top_k(),
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rerank_endpoint(),
            model: default_rerank_model(),
            api_key: None,
            timeout_secs: default_rerank_timeout(),
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_web_timeout(),
            engines: default_engines(),
            rescue_results: default_rescue_results(),
            web_agent_results: default_web_agent_results(),
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
            web_rescue_threshold: default_web_rescue_threshold(),
            scored_window: default_scored_window(),
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_secs: default_records_timeout(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            recent_turns: default_recent_turns(),
            session_context_messages: default_session_context_messages(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl SystemConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SystemConfig = toml::from_str(&content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.confidence;
        let ordered = 0.0 <= c.web_rescue_threshold
            && c.web_rescue_threshold <= c.medium_threshold
            && c.medium_threshold <= c.high_threshold
            && c.high_threshold <= 1.0;
        if !ordered {
            bail!(
                "confidence thresholds must satisfy 0 <= web_rescue ({}) <= medium ({}) <= high ({}) <= 1",
                c.web_rescue_threshold,
                c.medium_threshold,
                c.high_threshold
            );
        }
        if c.scored_window == 0 {
            bail!("confidence.scored_window must be at least 1");
        }
        if self.retrieval.pool_size == 0 || self.retrieval.top_k == 0 {
            bail!("retrieval.pool_size and retrieval.top_k must be positive");
        }
        if self.retrieval.top_k > self.retrieval.pool_size {
            bail!(
                "retrieval.top_k ({}) cannot exceed retrieval.pool_size ({})",
                self.retrieval.top_k,
                self.retrieval.pool_size
            );
        }
        Ok(())
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

impl RerankConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("COHERE_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
