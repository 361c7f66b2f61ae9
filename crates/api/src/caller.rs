//! Caller identity extractor

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use storage::CallerId;

/// Header carrying the caller identity
pub const CALLER_HEADER: &str = "x-caller-id";

/// Caller identity taken from `x-caller-id`. Absent, empty or non-UTF-8
/// values fall back to the anonymous caller; the request is never rejected.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(CallerId::new)
            .unwrap_or_default();
        Ok(Caller(id))
    }
}
