//! Turn orchestration: route, plan, then fold the planned agents over the state
//!
//! The state moves through the agents by value. If any agent fails the partially
//! updated state is dropped with the error, so callers never see (or persist) a
//! half-finished plan.

use tracing::{debug, info, instrument};

use medinote_common::{ChatbotError, ChatbotResult, ConversationState, RouteName, SystemConfig};

use crate::agents::{AgentDeps, AgentPool};
use crate::planner::RoutePlanner;
use crate::router;

pub struct Orchestrator {
    planner: RoutePlanner,
    pool: AgentPool,
}

impl Orchestrator {
    pub fn new(planner: RoutePlanner, pool: AgentPool) -> Self {
        Self { planner, pool }
    }

    /// Planner and full agent pool over one set of providers
    pub fn from_deps(deps: &AgentDeps, config: &SystemConfig) -> Self {
        Self::new(RoutePlanner::new(deps.llm.clone()), AgentPool::new(deps, config))
    }

    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    #[instrument(skip_all, fields(user_id = ?state.user_id, session_id = ?state.session_id))]
    pub async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let question = state.latest_user_text().trim().to_string();
        if question.is_empty() {
            debug!("Empty message, answering with general chat");
            state.route = Some(RouteName::Chit);
            return self.run_agent(RouteName::Chit, state).await;
        }

        let primary = router::route_text(&question);
        state.route = Some(primary);

        let routes = self.planner.plan(&question, primary).await;
        info!(route = %primary, ?routes, "Executing plan");

        for route in routes {
            state = self.run_agent(route, state).await?;
        }
        Ok(state)
    }

    async fn run_agent(&self, route: RouteName, state: ConversationState) -> ChatbotResult<ConversationState> {
        let agent = self
            .pool
            .get_agent(route)
            .ok_or_else(|| ChatbotError::UnknownRoute(route.to_string()))?;
        debug!(route = %route, "Running agent");
        agent.run(state).await
    }
}
