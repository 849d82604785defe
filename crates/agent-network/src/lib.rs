//! Medinote agent network: multi-agent orchestration for the health chatbot
//!
//! A turn flows through:
//! - a keyword intent router that picks a primary route
//! - an LLM route planner that may compose several agents
//! - the domain agents (chit, db, disease, drug, web, history), folded over the state
//! - the turn service, which seeds session context and persists the answer

pub mod agents;
pub mod builder;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod router;
pub mod service;

// Re-exports
pub use agents::{AgentDeps, AgentPool, DomainAgent};
pub use builder::{build_deps, build_service, service_from_deps};
pub use orchestrator::Orchestrator;
pub use planner::RoutePlanner;
pub use service::{ChatService, TurnRequest, TurnResponse, UNAVAILABLE_MESSAGE};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
