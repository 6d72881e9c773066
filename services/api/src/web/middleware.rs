//! services/api/src/web/middleware.rs
//!
//! Request extractors for session tokens and JSON bodies.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use dealership_core::{CoreError, SessionCheck, Subject};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Header used by older clients to carry the raw token.
pub const TOKEN_HEADER: &str = "x-token";
/// Cookie set at login.
pub const TOKEN_COOKIE: &str = "token";

/// Finds the presented token: `Authorization: Bearer`, then `x-token`, then the
/// `token` cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let raw = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                c.trim()
                    .strip_prefix(TOKEN_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        });

    [bearer, raw, cookie]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|token| !token.is_empty())
}

/// The outcome of validating whatever token the request carried.
/// Never rejects: a missing or bad token is simply `Invalid`.
pub struct MaybeSession(pub SessionCheck);

impl FromRequestParts<Arc<AppState>> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(&parts.headers);
        Ok(Self(state.sessions.validate(token).await))
    }
}

/// A caller with a live session. Anything else is rejected with 401.
pub struct RequireSession(pub Subject);

impl FromRequestParts<Arc<AppState>> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(&parts.headers);
        match state.sessions.validate(token).await {
            SessionCheck::Valid(subject) => Ok(Self(subject)),
            SessionCheck::Invalid => {
                warn!(path = %parts.uri.path(), "Rejected request without a live session");
                Err(CoreError::InvalidSession.into())
            }
        }
    }
}

/// A JSON body whose parse failures surface as a 400 in the API's error shape.
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("def"));
        assert_eq!(presented_token(&headers), Some("abc"));
    }

    #[test]
    fn falls_back_to_header_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=ghi"));
        assert_eq!(presented_token(&headers), Some("ghi"));

        headers.insert(TOKEN_HEADER, HeaderValue::from_static("def"));
        assert_eq!(presented_token(&headers), Some("def"));
    }

    #[test]
    fn blank_tokens_are_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("  "));
        assert_eq!(presented_token(&headers), None);
        assert_eq!(presented_token(&HeaderMap::new()), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=jkl"));
        assert_eq!(presented_token(&headers), Some("jkl"));
    }
}
