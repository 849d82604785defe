//! SearXNG API client for web search
//!
//! Used both as the dedicated web agent's source and as the rescue layer for
//! low-confidence local retrieval.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use medinote_common::{truncate_chars, ProviderError, ProviderResult, WebResult, WebSearchConfig};

use crate::web_search::WebSearch;

const PROVIDER: &str = "searxng";
const MAX_TITLE_CHARS: usize = 100;
const MAX_SNIPPET_CHARS: usize = 500;

/// `format=json` search reply
#[derive(Debug, Deserialize)]
struct SearXNGResponse {
    #[serde(default)]
    results: Vec<SearXNGResult>,
}

#[derive(Debug, Deserialize)]
struct SearXNGResult {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Web search over a self-hosted SearXNG instance
#[derive(Debug, Clone)]
pub struct SearXNGClient {
    /// Without trailing slash
    endpoint: String,

    client: Client,

    /// Hard cap applied on top of the caller's `top_k`
    max_results: usize,

    /// Sent as the comma-joined `engines` parameter when non-empty
    engines: Vec<String>,
}

impl SearXNGClient {
    /// Fails only when the HTTP client cannot be built.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub fn new(endpoint: String, timeout_secs: u64, max_results: usize, engines: Vec<String>) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let instance = Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            max_results,
            engines,
        };

        info!(
            "SearXNG web search ready: endpoint={}, timeout={}s, max_results={}",
            instance.endpoint, timeout_secs, max_results
        );

        Ok(instance)
    }

    /// Build from config. `None` when no endpoint is configured.
    pub fn from_config(config: &WebSearchConfig) -> ProviderResult<Option<Self>> {
        let Some(endpoint) = config.endpoint.clone() else {
            info!("No SearXNG endpoint configured, web search disabled");
            return Ok(None);
        };
        let max_results = config.rescue_results.max(config.web_agent_results);
        Self::new(endpoint, config.timeout_secs, max_results, config.engines.clone()).map(Some)
    }

    /// Validates that SearXNG is reachable and responding.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn health_check(&self) -> ProviderResult<()> {
        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::http(
                PROVIDER,
                response.status().as_u16(),
                "health check failed",
            ));
        }

        info!("SearXNG health check passed");
        Ok(())
    }

    /// Drop results whose URL was already seen. Results without a URL are kept.
    fn dedup_by_url(results: Vec<SearXNGResult>) -> Vec<SearXNGResult> {
        let mut seen = HashSet::new();
        results
            .into_iter()
            .filter(|r| match &r.url {
                Some(url) => seen.insert(url.clone()),
                None => true,
            })
            .collect()
    }

    fn to_web_result(result: SearXNGResult) -> WebResult {
        WebResult {
            title: result.title.map(|t| truncate_chars(t.trim(), MAX_TITLE_CHARS)),
            url: result.url,
            snippet: result.content.map(|c| truncate_chars(c.trim(), MAX_SNIPPET_CHARS)),
            score: result.score.filter(|s| s.is_finite()),
        }
    }
}

#[async_trait]
impl WebSearch for SearXNGClient {
    #[instrument(skip(self), fields(query_len = query.len(), endpoint = %self.endpoint))]
    async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<WebResult>> {
        let mut params = vec![("q", query.to_string()), ("format", "json".to_string())];
        if !self.engines.is_empty() {
            params.push(("engines", self.engines.join(",")));
        }

        debug!("Sending SearXNG request: params={:?}", params);

        let response = self
            .client
            .get(format!("{}/search", self.endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::http(PROVIDER, status.as_u16(), error_text));
        }

        let search_response: SearXNGResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))?;

        let limit = top_k.min(self.max_results);
        let results: Vec<WebResult> = Self::dedup_by_url(search_response.results)
            .into_iter()
            .take(limit)
            .map(Self::to_web_result)
            .collect();

        info!("SearXNG search completed: returning {} results", results.len());
        Ok(results)
    }
}
