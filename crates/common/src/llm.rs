//! Language-model gateway
//!
//! Agents only see the [`LanguageModel`] trait. [`OpenAiChatClient`] speaks the
//! OpenAI-compatible `/chat/completions` protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::LlmConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{Message, Role};

const PROVIDER: &str = "openai";

/// Label prepended to retrieved context when it is sent to the model
pub const CONTEXT_HEADER: &str = "[검색된 참고 정보]";

/// One generation request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub context: Option<String>,
    /// Earlier turns of the session, oldest first
    pub conversation: Vec<Message>,
    /// Overrides the client's default temperature
    pub temperature: Option<f32>,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            context: None,
            conversation: Vec::new(),
            temperature: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_conversation(mut self, conversation: &[Message]) -> Self {
        self.conversation = conversation.to_vec();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> ProviderResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible chat completion endpoint
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    default_temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
            default_temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages<'a>(prompt: &'a Prompt, context_block: Option<&'a str>) -> Vec<ChatMessage<'a>> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: &prompt.system,
        }];
        messages.extend(prompt.conversation.iter().map(|m| ChatMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        if let Some(block) = context_block {
            messages.push(ChatMessage {
                role: "user",
                content: block,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });
        messages
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &Prompt) -> ProviderResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PROVIDER))?;

        let context_block = prompt
            .context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("{}\n{}", CONTEXT_HEADER, c));

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: Self::build_messages(prompt, context_block.as_deref()),
            temperature: prompt.temperature.unwrap_or(self.default_temperature),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(PROVIDER, status.as_u16(), message));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response(PROVIDER, "no choices returned"))?
            .message
            .content
            .unwrap_or_default();

        debug!(chars = content.chars().count(), "Generated completion");
        Ok(content)
    }
}
