//! Auth routes — bearer-token session validation.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::Response;

use super::response::{error_response, ok};
use crate::services::session::{self, Identity};
use crate::state::AppState;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const EXPIRES_AT_HEADER: &str = "x-expires-at";

// =============================================================================
// BEARER EXTRACTOR
// =============================================================================

/// Raw session material presented by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix seconds, when the client told us.
    pub expires_at: Option<i64>,
}

/// Pull `Bearer <token>` out of an `Authorization` value.
pub(crate) fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for BearerSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let access_token = header(parts, AUTHORIZATION.as_str())
            .and_then(parse_bearer)
            .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Missing bearer token", None))?
            .to_owned();

        let expires_at = match header(parts, EXPIRES_AT_HEADER) {
            None => None,
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                error_response(StatusCode::BAD_REQUEST, "Invalid X-Expires-At header", Some(raw.to_owned()))
            })?),
        };
        let refresh_token = header(parts, REFRESH_TOKEN_HEADER).map(str::to_owned);

        Ok(Self { access_token, refresh_token, expires_at })
    }
}

/// Identity of a caller whose bearer token validated.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub identity: Identity,
    pub session: BearerSession,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = BearerSession::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);
        let identity = session::validate_bearer(
            app_state.auth.as_ref(),
            &bearer.access_token,
            bearer.expires_at,
            session::unix_now(),
        )
        .await
        .map_err(|e| {
            tracing::info!(reason = %e.reason(), "bearer token rejected");
            error_response(StatusCode::UNAUTHORIZED, "Invalid session", Some(e.reason().to_string()))
        })?;
        Ok(Self { identity, session: bearer })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/auth/session` — validate the caller's token and return its identity.
pub async fn session(auth: AuthUser) -> Response {
    if auth.session.refresh_token.is_some() {
        tracing::debug!(user_id = %auth.identity.user_id, "session presented with refresh token");
    }
    ok(auth.identity)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
