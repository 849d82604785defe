use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use medinote_agent_network::{build_service, ChatService};
use medinote_common::SystemConfig;
use medinote_history::ChatLog;

use crate::middleware::{get_tracing_layer, logging_middleware};
use crate::routes::{health, query, sessions};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
    pub chat_log: Arc<dyn ChatLog>,
}

impl AppState {
    /// Sessions are read from the same log the service writes to.
    pub fn new(service: ChatService) -> Self {
        let chat_log = service.chat_log().clone();
        Self {
            service: Arc::new(service),
            chat_log,
        }
    }
}

/// All routes with their middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/chatbot/query", post(query::chat_query))
        .route(
            "/chatbot/sessions",
            get(sessions::list_sessions).delete(sessions::delete_all_sessions),
        )
        .route(
            "/chatbot/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .layer(middleware::from_fn(logging_middleware))
        .layer(get_tracing_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: AppState,
    bind_address: String,
}

impl ApiServer {
    /// Build the turn service from configuration
    pub async fn new(config: &SystemConfig) -> Result<Self> {
        let service = build_service(config).await?;
        Ok(Self::with_service(service, config.server.bind_address()))
    }

    pub fn with_service(service: ChatService, bind_address: impl Into<String>) -> Self {
        Self {
            state: AppState::new(service),
            bind_address: bind_address.into(),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind_address))?;

        info!("Medinote API listening on http://{}", self.bind_address);
        axum::serve(listener, self.router())
            .await
            .context("HTTP server terminated")?;
        Ok(())
    }
}
