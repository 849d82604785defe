pub mod health;
pub mod query;
pub mod sessions;

use axum::http::HeaderMap;

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Maximum number of sessions returned by the listing endpoint
pub const SESSION_LIST_LIMIT: usize = 50;

/// Caller identity from `X-User-Id`; blank or non-UTF-8 values are anonymous.
pub(crate) fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
