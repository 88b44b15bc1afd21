//! Session validation.
//!
//! ARCHITECTURE
//! ============
//! A provider-issued session is turned into a minimal `Identity` projection.
//! Cheap local checks (shape, expiry) run before the provider round-trip so
//! an obviously dead token never costs a network call.
//!
//! TRADE-OFFS
//! ==========
//! No caching and no retries: every failure surfaces as `InvalidSession` and
//! the caller drops back to the signed-out state.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::backend::{AuthBackend, BackendError, BackendUser, Session};
use crate::error::{ErrorCode, ErrorKind};

/// Minimal user identity derived from a validated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: String,
    /// Profile row id. Profiles share the auth user's id.
    pub profile_id: Uuid,
}

/// Why a session was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Malformed,
    Expired,
    UserMismatch,
    Provider(BackendError),
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => f.write_str("malformed token"),
            Self::Expired => f.write_str("token expired"),
            Self::UserMismatch => f.write_str("token belongs to a different user"),
            Self::Provider(e) => write!(f, "provider rejected token: {e}"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session: {0}")]
    InvalidSession(InvalidReason),
}

impl SessionError {
    #[must_use]
    pub fn reason(&self) -> &InvalidReason {
        match self {
            Self::InvalidSession(reason) => reason,
        }
    }
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        "E_INVALID_SESSION"
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidSession
    }
}

/// Current time as unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_secs()).unwrap_or(i64::MAX)
}

/// A bearer token must be a three-segment JWT with non-empty segments.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    let mut parts = token.split('.');
    let ok = (0..3).all(|_| {
        parts
            .next()
            .is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'))
    });
    ok && parts.next().is_none()
}

/// Local shape and expiry checks, then resolve the token's user with the provider.
async fn resolve_user(
    backend: &dyn AuthBackend,
    access_token: &str,
    expires_at: Option<i64>,
    now: i64,
) -> Result<BackendUser, SessionError> {
    if !is_well_formed_token(access_token) {
        return Err(SessionError::InvalidSession(InvalidReason::Malformed));
    }
    if expires_at.is_some_and(|at| at <= now) {
        return Err(SessionError::InvalidSession(InvalidReason::Expired));
    }
    backend
        .get_user(access_token)
        .await
        .map_err(|e| SessionError::InvalidSession(InvalidReason::Provider(e)))
}

fn identity_for(user: BackendUser, fallback_role: Option<String>) -> Identity {
    let role = user
        .role
        .or(fallback_role)
        .unwrap_or_else(|| "authenticated".to_owned());
    Identity { user_id: user.id, role, profile_id: user.id }
}

/// Validate a session and project it onto an [`Identity`].
///
/// `now` is unix seconds.
///
/// # Errors
///
/// Returns [`SessionError::InvalidSession`] when the token is malformed or
/// expired, when the provider rejects it, or when the provider resolves it to
/// a different user than the session claims.
pub async fn validate_session(
    backend: &dyn AuthBackend,
    session: &Session,
    now: i64,
) -> Result<Identity, SessionError> {
    let user = resolve_user(backend, &session.access_token, Some(session.expires_at), now).await?;
    if user.id != session.user.id {
        return Err(SessionError::InvalidSession(InvalidReason::UserMismatch));
    }
    Ok(identity_for(user, session.user.role.clone()))
}

/// Validate a bare bearer token, as presented to an HTTP route.
///
/// The expiry check only runs when the caller supplied one; the provider
/// still rejects expired tokens on its side.
///
/// # Errors
///
/// Same as [`validate_session`], minus the user-mismatch case.
pub async fn validate_bearer(
    backend: &dyn AuthBackend,
    access_token: &str,
    expires_at: Option<i64>,
    now: i64,
) -> Result<Identity, SessionError> {
    let user = resolve_user(backend, access_token, expires_at, now).await?;
    Ok(identity_for(user, None))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
