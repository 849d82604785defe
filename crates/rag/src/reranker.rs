use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use medinote_common::{CandidatePassage, ProviderError, ProviderResult, RankedPassage, RerankConfig};

const PROVIDER: &str = "cohere";

/// Reranker output: position in the submitted list and its relevance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
    pub index: usize,
    pub score: Option<f64>,
}

/// Cross-encoder style reranker over plain texts
#[async_trait]
pub trait PassageReranker: Send + Sync {
    /// At most `top_k` hits ordered by descending relevance
    async fn rerank(&self, query: &str, texts: &[String], top_k: usize) -> ProviderResult<Vec<RerankHit>>;
}

/// Rerank `pool` and keep `top_k` passages.
///
/// Without a reranker, on error, or when the reranker returns nothing usable the
/// first `top_k` passages are kept in pool order with no score.
#[instrument(skip_all, fields(pool = pool.len(), top_k = top_k))]
pub async fn rerank_passages(
    reranker: Option<&dyn PassageReranker>,
    query: &str,
    pool: &[CandidatePassage],
    top_k: usize,
) -> Vec<RankedPassage> {
    if pool.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let Some(reranker) = reranker else {
        debug!("No reranker configured, keeping pool order");
        return passthrough(pool, top_k);
    };

    let texts: Vec<String> = pool.iter().map(|p| p.text.clone()).collect();
    let hits = match reranker.rerank(query, &texts, top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "Rerank failed, keeping pool order");
            return passthrough(pool, top_k);
        }
    };

    let mut seen = HashSet::new();
    let ranked: Vec<RankedPassage> = hits
        .into_iter()
        .filter(|hit| hit.index < pool.len() && seen.insert(hit.index))
        .take(top_k)
        .map(|hit| {
            let passage = &pool[hit.index];
            RankedPassage {
                text: passage.text.clone(),
                score: hit.score,
                detail_url: passage.detail_url.clone(),
                original_index: hit.index,
            }
        })
        .collect();

    if ranked.is_empty() {
        warn!("Reranker returned no usable hits, keeping pool order");
        return passthrough(pool, top_k);
    }
    ranked
}

fn passthrough(pool: &[CandidatePassage], top_k: usize) -> Vec<RankedPassage> {
    pool.iter()
        .take(top_k)
        .enumerate()
        .map(|(index, passage)| RankedPassage {
            text: passage.text.clone(),
            score: None,
            detail_url: passage.detail_url.clone(),
            original_index: index,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct CohereRerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct CohereRerankResponse {
    #[serde(default)]
    results: Vec<CohereRerankResult>,
}

#[derive(Debug, Deserialize)]
struct CohereRerankResult {
    index: usize,
    #[serde(default)]
    relevance_score: Option<f64>,
}

/// Cohere `/v1/rerank` client
#[derive(Debug, Clone)]
pub struct CohereReranker {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl CohereReranker {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let endpoint: String = endpoint.into();
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from config. `None` when no API key is available.
    pub fn from_config(config: &RerankConfig) -> ProviderResult<Option<Self>> {
        let Some(api_key) = config.resolved_api_key() else {
            info!("No rerank API key, reranking disabled");
            return Ok(None);
        };
        Self::new(&config.endpoint, &config.model, api_key, config.timeout_secs).map(Some)
    }
}

#[async_trait]
impl PassageReranker for CohereReranker {
    #[instrument(skip(self, query, texts), fields(model = %self.model, docs = texts.len()))]
    async fn rerank(&self, query: &str, texts: &[String], top_k: usize) -> ProviderResult<Vec<RerankHit>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/v1/rerank", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&CohereRerankRequest {
                model: &self.model,
                query,
                documents: texts,
                top_n: top_k.min(texts.len()),
            })
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(PROVIDER, status.as_u16(), message));
        }

        let parsed: CohereRerankResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| RerankHit {
                index: r.index,
                score: r.relevance_score,
            })
            .collect())
    }
}
