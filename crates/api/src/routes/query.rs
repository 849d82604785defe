use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, instrument};

use medinote_agent_network::TurnRequest;

use super::user_id;
use crate::{
    error::ApiError,
    server::AppState,
    types::{ChatQueryRequest, ChatQueryResponse},
};

/// Answer one chat turn.
///
/// A `session_id` of `0` opens a new session. When the engine cannot answer,
/// the reply is a fixed apology and nothing is stored, but the request still
/// succeeds.
#[instrument(skip_all)]
pub async fn chat_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatQueryRequest>, JsonRejection>,
) -> Result<Json<ChatQueryResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user_id = user_id(&headers);

    info!(session_id = request.session_id, has_user = user_id.is_some(), "Chat query received");

    let response = state
        .service
        .handle_turn(TurnRequest {
            session_id: Some(request.session_id),
            user_id,
            query: request.query,
        })
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(ChatQueryResponse {
        session_id: response.session_id,
        answer: response.answer,
        sources: response.sources,
    }))
}
