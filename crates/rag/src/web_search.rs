use async_trait::async_trait;

use medinote_common::{ProviderResult, WebResult};

/// External web search
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// At most `top_k` results
    async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<WebResult>>;
}
