//! Agent pool management

use std::collections::HashMap;
use std::sync::Arc;

use medinote_common::{RouteName, SystemConfig};

use super::{AgentDeps, ChitAgent, DomainAgent, HistoryAgent, KnowledgeAgent, KnowledgeSettings, RecordsAgent, WebAgent};

#[derive(Default)]
pub struct AgentPool {
    agents: HashMap<RouteName, Arc<dyn DomainAgent>>,
}

impl AgentPool {
    /// One agent per route, wired to the given providers
    pub fn new(deps: &AgentDeps, config: &SystemConfig) -> Self {
        let settings = KnowledgeSettings::from(config);

        let mut pool = Self::default();
        pool.register(Arc::new(ChitAgent::new(deps.llm.clone())));
        pool.register(Arc::new(RecordsAgent::new(deps.llm.clone(), deps.records.clone())));
        pool.register(Arc::new(KnowledgeAgent::disease(deps, &config.retrieval, settings.clone())));
        pool.register(Arc::new(KnowledgeAgent::drug(deps, &config.retrieval, settings)));
        pool.register(Arc::new(WebAgent::new(
            deps.llm.clone(),
            deps.web.clone(),
            config.web_search.web_agent_results,
        )));
        pool.register(Arc::new(HistoryAgent::new(
            deps.llm.clone(),
            deps.chat_log.clone(),
            config.history.recent_turns,
        )));
        pool
    }

    /// Add or replace the agent serving `agent.route()`
    pub fn register(&mut self, agent: Arc<dyn DomainAgent>) {
        self.agents.insert(agent.route(), agent);
    }

    pub fn get_agent(&self, route: RouteName) -> Option<Arc<dyn DomainAgent>> {
        self.agents.get(&route).cloned()
    }

    pub fn routes(&self) -> Vec<RouteName> {
        let mut routes: Vec<_> = self.agents.keys().copied().collect();
        routes.sort_by_key(|r| r.as_str().to_string());
        routes
    }
}
