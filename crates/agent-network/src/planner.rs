//! LLM route planner
//!
//! Asks the language model which agents should handle a message and in which
//! order. Any failure falls back to the router's primary route, so a turn is
//! always answered by at least one agent.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use medinote_common::{LanguageModel, Prompt, RouteName};

use crate::prompts::{planner_user_message, PLANNER_SYSTEM_PROMPT};

#[derive(Debug, Deserialize)]
struct PlannerReply {
    #[serde(default)]
    routes: Value,
}

pub struct RoutePlanner {
    llm: Arc<dyn LanguageModel>,
}

impl RoutePlanner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Ordered, duplicate-free, non-empty list of routes for `user_message`
    #[instrument(skip(self, user_message), fields(primary = %primary))]
    pub async fn plan(&self, user_message: &str, primary: RouteName) -> Vec<RouteName> {
        if user_message.trim().is_empty() {
            return vec![primary];
        }

        let prompt = Prompt::new(PLANNER_SYSTEM_PROMPT, planner_user_message(user_message, primary))
            .with_temperature(0.0);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Planner call failed, using primary route");
                return vec![primary];
            }
        };

        match parse_routes(&raw) {
            Some(routes) => {
                debug!(?routes, "Planned routes");
                routes
            }
            None => {
                warn!(raw = %raw, "Unusable planner reply, using primary route");
                vec![primary]
            }
        }
    }
}

/// Parse a planner reply. `None` when the reply has no usable route.
///
/// Unknown names are dropped and duplicates keep their first position. A reply
/// wrapped in a markdown code fence is accepted.
pub fn parse_routes(raw: &str) -> Option<Vec<RouteName>> {
    let reply: PlannerReply = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let Value::Array(items) = reply.routes else {
        return None;
    };

    let mut routes = Vec::new();
    for route in items.iter().filter_map(Value::as_str).filter_map(RouteName::parse) {
        if !routes.contains(&route) {
            routes.push(route);
        }
    }

    (!routes.is_empty()).then_some(routes)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes_filters_unknown_names() {
        assert_eq!(
            parse_routes(r#"{"routes": ["drug", "pharmacy", 3, "web"]}"#),
            Some(vec![RouteName::Drug, RouteName::Web])
        );
    }

    #[test]
    fn test_parse_routes_rejects_unusable_replies() {
        assert_eq!(parse_routes(""), None);
        assert_eq!(parse_routes("drug"), None);
        assert_eq!(parse_routes(r#"{"routes": "drug"}"#), None);
        assert_eq!(parse_routes(r#"{"routes": []}"#), None);
        assert_eq!(parse_routes(r#"{"routes": ["DRUG"]}"#), None);
        assert_eq!(parse_routes(r#"{"plan": ["drug"]}"#), None);
        assert_eq!(parse_routes(r#"["drug"]"#), None);
    }

    #[test]
    fn test_parse_routes_accepts_fenced_json() {
        let raw = "```json\n{\"routes\": [\"history\", \"db\"]}\n```";
        assert_eq!(parse_routes(raw), Some(vec![RouteName::History, RouteName::Db]));

        let raw = "```\n{\"routes\": [\"chit\"]}\n```";
        assert_eq!(parse_routes(raw), Some(vec![RouteName::Chit]));
    }
}
