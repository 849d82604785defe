//! Answers that refer back to earlier conversations

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use medinote_common::{ChatbotResult, ConversationState, LanguageModel, Prompt, RouteName};
use medinote_history::{ChatLog, LoggedTurn};

use super::{agent_meta, generate, DomainAgent};
use crate::prompts::history_system_prompt;

pub const HISTORY_LOGIN_REQUIRED_MESSAGE: &str =
    "현재 사용자 정보를 확인할 수 없어 이전 대화 기록을 불러올 수 없습니다. 로그인이 되어 있는지 확인해주세요.";
pub const NO_HISTORY_MESSAGE: &str = "현재 저장된 이전 대화 기록이 없어서, 과거 대화를 참고할 수 없습니다. \
     질문을 다시 구체적으로 말씀해 주시면, 새로운 질문으로 답변해 드릴게요.";

pub struct HistoryAgent {
    llm: Arc<dyn LanguageModel>,
    chat_log: Arc<dyn ChatLog>,
    recent_turns: usize,
}

impl HistoryAgent {
    pub fn new(llm: Arc<dyn LanguageModel>, chat_log: Arc<dyn ChatLog>, recent_turns: usize) -> Self {
        Self {
            llm,
            chat_log,
            recent_turns,
        }
    }
}

#[async_trait]
impl DomainAgent for HistoryAgent {
    fn route(&self) -> RouteName {
        RouteName::History
    }

    #[instrument(name = "history_agent", skip_all)]
    async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let mut meta = agent_meta(RouteName::History);

        let Some(user_id) = state.user_id.clone() else {
            info!("No user id on the turn, skipping history lookup");
            state.push_reply(HISTORY_LOGIN_REQUIRED_MESSAGE, Vec::new(), meta);
            return Ok(state);
        };

        let turns = match self.chat_log.recent_turns(&user_id, self.recent_turns).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(error = %e, "Loading chat history failed");
                Vec::new()
            }
        };
        meta.insert("log_count".into(), turns.len().into());

        if turns.is_empty() {
            state.push_reply(NO_HISTORY_MESSAGE, Vec::new(), meta);
            return Ok(state);
        }

        let prompt =
            Prompt::new(history_system_prompt(), state.latest_user_text()).with_context(Some(transcript(&turns)));
        let answer = generate(self.llm.as_ref(), prompt).await?;

        state.push_reply(answer, Vec::new(), meta);
        Ok(state)
    }
}

/// Dated user/assistant blocks in the order the log returned them
pub fn transcript(turns: &[LoggedTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            format!(
                "[{}] user: {}\nassistant: {}",
                turn.created_at.format("%Y-%m-%d %H:%M"),
                turn.query,
                turn.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
