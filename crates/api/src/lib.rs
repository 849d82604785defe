//! # Medinote HTTP API
//!
//! Thin axum surface over the turn service and the chat log.
//!
//! ```text
//! POST   /chatbot/query              answer one turn
//! GET    /chatbot/sessions           latest sessions, newest first
//! DELETE /chatbot/sessions           delete every session
//! GET    /chatbot/sessions/{id}      one session's messages
//! DELETE /chatbot/sessions/{id}      delete one session
//! GET    /health                     liveness
//! ```
//!
//! The caller identifies itself with an optional `X-User-Id` header. Error
//! bodies are [`ErrorResponse`] values and never carry internal error text.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use server::{router, ApiServer, AppState};
pub use types::*;
