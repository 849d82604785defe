//! API error type and its HTTP rendering

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::types::ErrorResponse;

const NOT_FOUND_MESSAGE: &str = "요청하신 대화 세션을 찾을 수 없습니다.";
const BAD_REQUEST_MESSAGE: &str = "요청 형식이 올바르지 않습니다. 입력 내용을 확인해 주세요.";
const INTERNAL_MESSAGE: &str = "일시적인 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Failures a handler can report. The `Display` text is logged, never sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(i64),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::BadRequest(_) => "INVALID_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text shown to end users
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => NOT_FOUND_MESSAGE,
            Self::BadRequest(_) => BAD_REQUEST_MESSAGE,
            Self::Internal(_) => INTERNAL_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::SessionNotFound(_) => debug!(error = %self, "Request rejected"),
            Self::BadRequest(_) => warn!(error = %self, "Request rejected"),
            Self::Internal(_) => error!(error = %self, "Request failed"),
        }

        let body = ErrorResponse {
            error: self.public_message().to_string(),
            code: Some(self.code().to_string()),
            timestamp: Utc::now(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detail_stays_out_of_public_message() {
        let err = ApiError::internal("password authentication failed for user \"medinote\"");
        assert!(err.to_string().contains("password authentication failed"));
        assert!(!err.public_message().contains("password"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_and_code_per_variant() {
        assert_eq!(ApiError::SessionNotFound(3).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::SessionNotFound(3).code(), "SESSION_NOT_FOUND");
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::BadRequest("x".into()).code(), "INVALID_REQUEST");
    }
}
