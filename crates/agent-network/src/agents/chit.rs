//! General conversation without retrieval

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use medinote_common::{ChatbotResult, ConversationState, LanguageModel, Prompt, RouteName};

use super::{agent_meta, generate, DomainAgent};
use crate::prompts::chit_system_prompt;

pub struct ChitAgent {
    llm: Arc<dyn LanguageModel>,
}

impl ChitAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl DomainAgent for ChitAgent {
    fn route(&self) -> RouteName {
        RouteName::Chit
    }

    #[instrument(name = "chit_agent", skip_all)]
    async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let prompt =
            Prompt::new(chit_system_prompt(), state.latest_user_text()).with_conversation(state.earlier_turns());
        let answer = generate(self.llm.as_ref(), prompt).await?;

        state.push_reply(answer, Vec::new(), agent_meta(RouteName::Chit));
        Ok(state)
    }
}
