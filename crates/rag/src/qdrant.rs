//! Qdrant REST retriever with Ollama query embeddings

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use medinote_common::{CandidatePassage, ProviderError, ProviderResult, RetrievalConfig};

use crate::retriever::VectorRetriever;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct QdrantRetriever {
    client: Client,
    qdrant_url: String,
    ollama_url: String,
    embedding_model: String,
    text_field: String,
    url_field: String,
}

impl QdrantRetriever {
    pub fn new(config: &RetrievalConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ProviderError::transport("qdrant", e.to_string()))?;

        info!(
            qdrant = %config.qdrant_url,
            ollama = %config.ollama_url,
            model = %config.embedding_model,
            "Initialized Qdrant retriever"
        );

        Ok(Self {
            client,
            qdrant_url: config.qdrant_url.trim_end_matches('/').to_string(),
            ollama_url: config.ollama_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            text_field: config.text_field.clone(),
            url_field: config.url_field.clone(),
        })
    }

    async fn embed(&self, query: &str) -> ProviderResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.ollama_url))
            .json(&EmbeddingRequest {
                model: &self.embedding_model,
                prompt: query,
            })
            .send()
            .await
            .map_err(|e| ProviderError::transport("ollama", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::http("ollama", status.as_u16(), message));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response("ollama", e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(ProviderError::invalid_response("ollama", "empty embedding"));
        }
        Ok(parsed.embedding)
    }

    fn to_passage(&self, point: ScoredPoint) -> Option<CandidatePassage> {
        let payload = point.payload?;
        let text = payload
            .get(&self.text_field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())?;
        let detail_url = payload
            .get(&self.url_field)
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Some(CandidatePassage {
            text: text.to_string(),
            detail_url,
        })
    }
}

#[async_trait]
impl VectorRetriever for QdrantRetriever {
    #[instrument(skip(self, query))]
    async fn retrieve(&self, collection: &str, query: &str, k: usize) -> ProviderResult<Vec<CandidatePassage>> {
        let vector = self.embed(query).await?;

        let response = self
            .client
            .post(format!("{}/collections/{}/points/search", self.qdrant_url, collection))
            .json(&SearchRequest {
                vector: &vector,
                limit: k,
                with_payload: true,
            })
            .send()
            .await
            .map_err(|e| ProviderError::transport("qdrant", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::http("qdrant", status.as_u16(), message));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response("qdrant", e.to_string()))?;

        let passages: Vec<_> = parsed
            .result
            .into_iter()
            .filter_map(|point| self.to_passage(point))
            .collect();

        debug!(collection, count = passages.len(), "Qdrant search completed");
        Ok(passages)
    }
}
