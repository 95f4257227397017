use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs() as i64)
    .unwrap_or_default()
}

/// Case-insensitive comparison for usernames and passwords.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
  a == b || a.to_lowercase() == b.to_lowercase()
}

/// Temporary (302) redirect.
pub fn found(location: impl Into<String>) -> Response {
  (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}
