use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use medinote_common::{CandidatePassage, ProviderResult};

/// Vector index over named document collections
#[async_trait]
pub trait VectorRetriever: Send + Sync {
    /// Up to `k` passages from `collection`, best match first
    async fn retrieve(&self, collection: &str, query: &str, k: usize) -> ProviderResult<Vec<CandidatePassage>>;
}

/// Concatenate pools, dropping passages whose text was already seen, and cap at `limit`
pub fn merge_pools<I>(pools: I, limit: usize) -> Vec<CandidatePassage>
where
    I: IntoIterator<Item = Vec<CandidatePassage>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for passage in pools.into_iter().flatten() {
        if merged.len() >= limit {
            break;
        }
        if seen.insert(passage.text.clone()) {
            merged.push(passage);
        }
    }
    merged
}

/// Query each collection for `pool_size` passages and merge the results.
///
/// A collection that fails contributes nothing.
#[instrument(skip(retriever, query))]
pub async fn gather_pool(
    retriever: &dyn VectorRetriever,
    collections: &[&str],
    query: &str,
    pool_size: usize,
) -> Vec<CandidatePassage> {
    let mut pools = Vec::with_capacity(collections.len());

    for collection in collections {
        match retriever.retrieve(collection, query, pool_size).await {
            Ok(passages) => {
                debug!(collection, count = passages.len(), "Retrieved passages");
                pools.push(passages);
            }
            Err(e) => warn!(collection, error = %e, "Retrieval failed, skipping collection"),
        }
    }

    merge_pools(pools, pool_size)
}
