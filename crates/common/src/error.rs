use thiserror::Error;

/// Failure of an external capability (language model, vector index, reranker, web search, record backend, chat log)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: String },

    #[error("{provider} transport error: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    pub fn not_configured(provider: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider: provider.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Transport failures, rate limiting and server errors may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::NotConfigured { provider }
            | Self::Transport { provider, .. }
            | Self::Http { provider, .. }
            | Self::InvalidResponse { provider, .. } => provider,
        }
    }
}

/// Errors that escape an agent or the orchestrator
#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("Generation error: {0}")]
    Generation(#[source] ProviderError),

    #[error("Persistence error: {0}")]
    Persistence(#[source] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No agent registered for route: {0}")]
    UnknownRoute(String),
}

impl ChatbotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type ChatbotResult<T> = std::result::Result<T, ChatbotError>;
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::transport("cohere", "connection reset").is_retryable());
        assert!(ProviderError::http("cohere", 503, "unavailable").is_retryable());
        assert!(ProviderError::http("cohere", 429, "slow down").is_retryable());
        assert!(!ProviderError::http("cohere", 400, "bad request").is_retryable());
        assert!(!ProviderError::not_configured("searxng").is_retryable());
        assert!(!ProviderError::invalid_response("qdrant", "no result").is_retryable());
    }

    #[test]
    fn test_display_includes_provider() {
        let err = ProviderError::http("openai", 500, "boom");
        assert_eq!(err.to_string(), "openai returned HTTP 500: boom");
        assert_eq!(err.provider(), "openai");

        let wrapped = ChatbotError::Generation(err);
        assert!(wrapped.to_string().starts_with("Generation error"));
    }
}
