use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Identifier of the domain agent that handles a turn
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouteName {
    /// General conversation, no retrieval
    Chit,
    /// The user's own medical records
    Db,
    Disease,
    Drug,
    /// Live web search for recent information
    Web,
    /// Previously logged conversations
    History,
}

impl RouteName {
    /// Parse a planner-provided route name. Only the exact lowercase names are accepted.
    pub fn parse(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Write-only diagnostic bag attached to messages
pub type Meta = Map<String, Value>;

/// Message in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            meta: Meta::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, meta: Meta) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            meta,
        }
    }
}

/// Provenance entry attached to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub collection: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<f64>,
}

/// Unranked passage returned by a vector collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePassage {
    pub text: String,
    pub detail_url: Option<String>,
}

impl CandidatePassage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detail_url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = Some(url.into());
        self
    }
}

/// Passage kept after reranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub text: String,
    /// Relevance in [0,1], `None` when the reranker could not score
    pub score: Option<f64>,
    pub detail_url: Option<String>,
    /// Position in the candidate pool
    pub original_index: usize,
}

/// External web search hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub score: Option<f64>,
}

/// Unit of work threaded through router, planner and agents for one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: Option<String>,
    pub session_id: Option<i64>,
    pub messages: Vec<Message>,
    pub route: Option<RouteName>,
    pub answer: Option<String>,
    pub sources: Vec<SourceRecord>,
}

impl ConversationState {
    /// Fresh state for a new user turn
    pub fn new_turn(user_id: Option<String>, session_id: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            user_id,
            session_id: session_id.filter(|id| *id > 0),
            messages: vec![Message::user(text)],
            ..Default::default()
        }
    }

    /// Fresh state whose log starts with earlier messages of the same session
    pub fn with_history(
        user_id: Option<String>,
        session_id: Option<i64>,
        history: Vec<Message>,
        text: impl Into<String>,
    ) -> Self {
        let mut state = Self::new_turn(user_id, session_id, text);
        state.messages.splice(0..0, history);
        state
    }

    /// Content of the latest message, empty when there is none
    pub fn last_message_text(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or("")
    }

    /// The question agents answer: the newest user-authored message
    pub fn latest_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Messages before the newest user message: the reloaded session context.
    ///
    /// Replies added by earlier agents of the current plan are not included.
    pub fn earlier_turns(&self) -> &[Message] {
        let latest = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::User)
            .unwrap_or(0);
        &self.messages[..latest]
    }

    /// Record an agent's reply. Answer and sources are overwritten, never merged.
    pub fn push_reply(&mut self, answer: impl Into<String>, sources: Vec<SourceRecord>, meta: Meta) {
        let answer = answer.into();
        self.messages.push(Message::assistant(answer.clone(), meta));
        self.answer = Some(answer);
        self.sources = sources;
    }
}

/// Truncate to at most `max` characters (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
