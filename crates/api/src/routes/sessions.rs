use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, instrument};

use super::{user_id, SESSION_LIST_LIMIT};
use crate::{
    error::ApiError,
    server::AppState,
    types::{MessageItem, SessionDetailResponse, SessionItem, SessionListResponse},
};

/// Latest sessions of the caller, newest first
#[instrument(skip_all)]
pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state
        .chat_log
        .list_sessions(user_id(&headers).as_deref(), SESSION_LIST_LIMIT)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionItem::from).collect(),
    }))
}

/// Every message of one session, oldest first
#[instrument(skip_all)]
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    session_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let Path(session_id) = session_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let messages = state
        .chat_log
        .session_messages(session_id, user_id(&headers).as_deref())
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::SessionNotFound(session_id))?;

    Ok(Json(SessionDetailResponse {
        session_id,
        messages: messages.into_iter().map(MessageItem::from).collect(),
    }))
}

#[instrument(skip_all)]
pub async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    session_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<String>, ApiError> {
    let Path(session_id) = session_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let deleted = state
        .chat_log
        .delete_session(session_id, user_id(&headers).as_deref())
        .await
        .map_err(ApiError::internal)?;
    if !deleted {
        return Err(ApiError::SessionNotFound(session_id));
    }

    info!(session_id, "Session deleted");
    Ok(Json(format!("Session {session_id} deleted.")))
}

#[instrument(skip_all)]
pub async fn delete_all_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<String>, ApiError> {
    state
        .chat_log
        .delete_all_sessions(user_id(&headers).as_deref())
        .await
        .map_err(ApiError::internal)?;

    info!("All sessions deleted");
    Ok(Json("All chatbot sessions deleted.".to_string()))
}
