//! Live web search answers

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use medinote_common::{ChatbotResult, ConversationState, LanguageModel, Prompt, RouteName, SourceRecord, WebResult};
use medinote_rag::WebSearch;

use super::{agent_meta, generate, DomainAgent};
use crate::prompts::web_system_prompt;

pub const NO_WEB_RESULTS_MESSAGE: &str = "신뢰할 만한 검색 결과를 찾지 못했습니다. \
     질문을 조금 더 구체적으로 말씀해 주시면 다시 찾아볼게요. \
     건강과 관련된 중요한 결정은 의사나 약사와 먼저 상의해 주세요.";

pub struct WebAgent {
    llm: Arc<dyn LanguageModel>,
    web: Option<Arc<dyn WebSearch>>,
    top_k: usize,
}

impl WebAgent {
    pub fn new(llm: Arc<dyn LanguageModel>, web: Option<Arc<dyn WebSearch>>, top_k: usize) -> Self {
        Self { llm, web, top_k }
    }
}

#[async_trait]
impl DomainAgent for WebAgent {
    fn route(&self) -> RouteName {
        RouteName::Web
    }

    #[instrument(name = "web_agent", skip_all, fields(top_k = self.top_k))]
    async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let question = state.latest_user_text().to_string();
        let results = search_or_empty(self.web.as_deref(), &question, self.top_k).await;

        let mut meta = agent_meta(RouteName::Web);
        meta.insert("result_count".into(), results.len().into());

        if results.is_empty() {
            info!("No web results, skipping generation");
            state.push_reply(NO_WEB_RESULTS_MESSAGE, Vec::new(), meta);
            return Ok(state);
        }

        let context = web_context(&results);
        let sources = web_sources(&results);
        let prompt = Prompt::new(web_system_prompt(), question)
            .with_context(Some(context))
            .with_conversation(state.earlier_turns());
        let answer = generate(self.llm.as_ref(), prompt).await?;

        state.push_reply(answer, sources, meta);
        Ok(state)
    }
}

/// Search, absorbing a missing provider or a failed call into an empty result
pub(crate) async fn search_or_empty(web: Option<&dyn WebSearch>, query: &str, top_k: usize) -> Vec<WebResult> {
    let Some(web) = web else {
        return Vec::new();
    };
    match web.search(query, top_k).await {
        Ok(mut results) => {
            results.truncate(top_k);
            results
        }
        Err(e) => {
            warn!(error = %e, "Web search failed");
            Vec::new()
        }
    }
}

/// Title and snippet blocks numbered from 1
pub(crate) fn web_context(results: &[WebResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut block = format!(
                "[웹 {}] {}\n{}",
                i + 1,
                r.title.as_deref().unwrap_or("(제목 없음)"),
                r.snippet.as_deref().unwrap_or("")
            );
            if let Some(url) = &r.url {
                block.push_str(&format!("\n출처: {url}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn web_sources(results: &[WebResult]) -> Vec<SourceRecord> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| SourceRecord {
            id: format!("web-{}", i + 1),
            collection: "web".to_string(),
            title: r.title.clone(),
            url: r.url.clone(),
            score: r.score,
        })
        .collect()
}
