//! Retrieval-augmentation building blocks for the domain agents
//!
//! Every provider sits behind a trait so agents can run against fakes. Failures
//! are returned as [`ProviderError`](medinote_common::ProviderError); the
//! degrade helpers in [`retriever`] and [`reranker`] turn them into empty or
//! unscored results.

pub mod qdrant;
pub mod qscore;
pub mod reranker;
pub mod retriever;
pub mod searxng_client;
pub mod web_search;

pub use qdrant::QdrantRetriever;
pub use qscore::{confidence, ConfidenceThresholds, Reliability};
pub use reranker::{rerank_passages, CohereReranker, PassageReranker, RerankHit};
pub use retriever::{gather_pool, merge_pools, VectorRetriever};
pub use searxng_client::SearXNGClient;
pub use web_search::WebSearch;
