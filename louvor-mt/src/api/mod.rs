//! HTTP API handlers for louvor-mt

pub mod health;
pub mod multitrack;
pub mod songs;

pub use health::health_routes;
pub use multitrack::multitrack_routes;
pub use songs::song_routes;

use axum::http::HeaderMap;

use crate::access::USER_ID_HEADER;

/// Caller identity set by the auth gateway, if any
pub(crate) fn caller_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
