//! Auth store — in-memory mirror of the signed-in user, session and profile.
//!
//! ARCHITECTURE
//! ============
//! Every operation delegates to the backend provider and then updates local
//! state. Provider failures never escape raw: they are converted into an
//! `AuthError` with a taxonomy kind and a user-presentable message, and
//! captured by the error reporter on the way out.
//!
//! TRADE-OFFS
//! ==========
//! Sign-out clears local state even when the provider call fails. A dangling
//! server-side session is preferable to a UI that still shows the previous
//! user's data. Sign-in racing sign-out is not guarded.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::backend::{AuthBackend, BackendError, BackendUser, Credentials, Profile, ProfileUpdate, Session, SignOutScope};
use crate::error::{ErrorCode, ErrorKind};
use crate::services::profile_cache::{ProfileCache, ProfileError};
use crate::services::query_cache::RequestCache;
use crate::services::session::{self, Identity, SessionError};
use crate::telemetry::ErrorReporter;

// =============================================================================
// ERROR
// =============================================================================

/// UI-facing auth failure. Presentation code branches on `kind` only.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct AuthError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AuthError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    fn no_session() -> Self {
        Self::new(ErrorKind::InvalidSession, "You are not signed in.")
    }
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::NetworkFailure => "E_AUTH_NETWORK",
            ErrorKind::InvalidCredentials => "E_AUTH_INVALID_CREDENTIALS",
            ErrorKind::RateLimited => "E_AUTH_RATE_LIMITED",
            ErrorKind::InvalidSession => "E_AUTH_INVALID_SESSION",
            ErrorKind::NotFound => "E_AUTH_NOT_FOUND",
            ErrorKind::Unknown => "E_AUTH_UNKNOWN",
        }
    }

    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Which provider call failed; decides how ambiguous statuses are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthOperation {
    SignIn,
    SignOut,
    Refresh,
    Profile,
}

impl AuthOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::SignOut => "sign_out",
            Self::Refresh => "refresh_session",
            Self::Profile => "profile",
        }
    }
}

fn is_credential_code(code: Option<&str>) -> bool {
    matches!(code, Some("invalid_grant" | "invalid_credentials" | "email_not_confirmed"))
}

/// Convert a provider failure into a UI-facing error.
fn map_backend_error(op: AuthOperation, err: &BackendError) -> AuthError {
    match err {
        BackendError::Network(_) => AuthError::new(
            ErrorKind::NetworkFailure,
            "Unable to reach the authentication service. Check your connection and try again.",
        ),
        BackendError::Status { status: 429, .. } => {
            AuthError::new(ErrorKind::RateLimited, "Too many attempts. Please wait a moment and try again.")
        }
        BackendError::Status { status, code, .. }
            if op == AuthOperation::SignIn
                && (matches!(status, 400 | 401 | 422) || is_credential_code(code.as_deref())) =>
        {
            AuthError::new(ErrorKind::InvalidCredentials, "Invalid email or password.")
        }
        BackendError::Status { status, code, .. }
            if op == AuthOperation::Refresh && (matches!(status, 400 | 401) || is_credential_code(code.as_deref())) =>
        {
            AuthError::new(ErrorKind::InvalidSession, "Your session has expired. Please sign in again.")
        }
        BackendError::Status { message, .. } => AuthError::new(ErrorKind::Unknown, message.clone()),
        other => AuthError::new(ErrorKind::Unknown, other.to_string()),
    }
}

fn map_profile_error(err: &ProfileError) -> AuthError {
    match err {
        ProfileError::NotFound(_) => AuthError::new(ErrorKind::NotFound, "Profile not found."),
        ProfileError::Backend(e) => map_backend_error(AuthOperation::Profile, e),
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Point-in-time copy of the store, safe to hand to rendering code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub user: Option<BackendUser>,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    #[serde(skip)]
    pub session: Option<Session>,
}

impl AuthSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

fn identity_from_session(session: &Session) -> Identity {
    Identity {
        user_id: session.user.id,
        role: session
            .user
            .role
            .clone()
            .unwrap_or_else(|| "authenticated".to_owned()),
        profile_id: session.user.id,
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct AuthStore {
    auth: Arc<dyn AuthBackend>,
    profiles: ProfileCache,
    reporter: Arc<dyn ErrorReporter>,
    state: Arc<RwLock<AuthSnapshot>>,
}

impl AuthStore {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthBackend>, profiles: ProfileCache, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { auth, profiles, reporter, state: Arc::new(RwLock::new(AuthSnapshot::default())) }
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthSnapshot> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthSnapshot> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn report(&self, op: AuthOperation, err: AuthError) -> AuthError {
        self.reporter
            .capture(&err, &[("component", "auth_store".to_owned()), ("operation", op.as_str().to_owned())]);
        err
    }

    fn fail(&self, op: AuthOperation, err: &BackendError) -> AuthError {
        tracing::warn!(operation = op.as_str(), error = %err, "auth provider call failed");
        self.report(op, map_backend_error(op, err))
    }

    /// Installing a different user drops every cached profile first.
    fn install(&self, session: Session, identity: Identity) {
        let mut state = self.write();
        let previous = state.identity.as_ref().map(|i| i.user_id);
        if previous.is_some_and(|id| id != identity.user_id) {
            tracing::info!(user_id = %identity.user_id, "switching user, clearing profile cache");
            self.profiles.clear();
        }
        state.user = Some(session.user.clone());
        state.identity = Some(identity);
        state.session = Some(session);
        state.profile = None;
    }

    /// Load the profile for the current identity through the cache. A result
    /// for a user who is no longer signed in is dropped.
    async fn load_profile(&self, identity: &Identity) -> Result<Profile, AuthError> {
        let profile = self
            .profiles
            .get(identity.profile_id)
            .await
            .map_err(|e| self.report(AuthOperation::Profile, map_profile_error(&e)))?;
        let mut state = self.write();
        if state.identity.as_ref().map(|i| i.user_id) == Some(identity.user_id) {
            state.profile = Some(profile.clone());
        }
        Ok(profile)
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.read().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().identity.is_some()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    #[must_use]
    pub fn profile_cache(&self) -> &ProfileCache {
        &self.profiles
    }

    /// Restore a persisted session. Invalid sessions leave the store signed out.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_session` error when the session fails validation.
    pub async fn initialize(&self, session: Session) -> Result<AuthSnapshot, AuthError> {
        let identity = match session::validate_session(self.auth.as_ref(), &session, session::unix_now()).await {
            Ok(identity) => identity,
            Err(SessionError::InvalidSession(reason)) => {
                tracing::info!(%reason, "stored session rejected");
                *self.write() = AuthSnapshot::default();
                return Err(AuthError::new(ErrorKind::InvalidSession, "Your session has expired. Please sign in again."));
            }
        };
        self.install(session, identity.clone());
        if let Err(e) = self.load_profile(&identity).await {
            tracing::warn!(error = %e, "profile load after session restore failed");
        }
        Ok(self.snapshot())
    }

    /// Sign in with email and password.
    ///
    /// A failed profile load is logged and does not fail the sign-in.
    ///
    /// # Errors
    ///
    /// Returns `invalid_credentials` for blank or rejected credentials,
    /// `rate_limited` when the provider throttles, `network` on transport
    /// failure and `unknown` otherwise.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSnapshot, AuthError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::new(ErrorKind::InvalidCredentials, "Email and password are required."));
        }

        let session = self
            .auth
            .sign_in_with_password(credentials)
            .await
            .map_err(|e| self.fail(AuthOperation::SignIn, &e))?;

        let identity = identity_from_session(&session);
        tracing::info!(user_id = %identity.user_id, "signed in");
        self.install(session, identity.clone());

        if let Err(e) = self.load_profile(&identity).await {
            tracing::warn!(error = %e, "profile load after sign-in failed");
        }
        Ok(self.snapshot())
    }

    /// Sign out and wipe every piece of per-user state.
    ///
    /// Before returning, and regardless of the provider result, the profile
    /// cache, the supplied request cache and the in-memory session are all
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns the mapped provider error if revocation failed. Local state is
    /// already cleared at that point.
    pub async fn sign_out(&self, scope: SignOutScope, cache: &dyn RequestCache) -> Result<(), AuthError> {
        let token = self.access_token();
        let result = match token {
            Some(token) => self.auth.sign_out(&token, scope).await,
            None => Ok(()),
        };

        self.profiles.clear();
        cache.clear();
        let previous = std::mem::take(&mut *self.write());
        if let Some(identity) = previous.identity {
            tracing::info!(user_id = %identity.user_id, scope = scope.as_str(), "signed out");
        }

        result.map_err(|e| self.fail(AuthOperation::SignOut, &e))
    }

    /// Exchange the refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `invalid_session` when there is no session or the provider
    /// rejects the refresh token; other kinds as for [`AuthStore::sign_in`].
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let Some(refresh_token) = self
            .read()
            .session
            .as_ref()
            .map(|s| s.refresh_token.clone())
        else {
            return Err(AuthError::no_session());
        };

        let session = self
            .auth
            .refresh_session(&refresh_token)
            .await
            .map_err(|e| self.fail(AuthOperation::Refresh, &e))?;

        let mut state = self.write();
        if state.identity.as_ref().map(|i| i.user_id) != Some(session.user.id) {
            // Signed out (or switched user) while the refresh was in flight.
            return Err(AuthError::no_session());
        }
        state.user = Some(session.user.clone());
        state.session = Some(session.clone());
        Ok(session)
    }

    /// Drop the cached profile for the current user and load it again.
    ///
    /// # Errors
    ///
    /// Returns `invalid_session` when signed out, or the mapped fetch error.
    pub async fn refresh_profile(&self) -> Result<Profile, AuthError> {
        let identity = self.identity().ok_or_else(AuthError::no_session)?;
        self.profiles.invalidate(identity.profile_id);
        self.load_profile(&identity).await
    }

    /// Apply a partial profile edit for the current user.
    ///
    /// # Errors
    ///
    /// Returns `invalid_session` when signed out, or the mapped provider error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, AuthError> {
        let (identity, token) = {
            let state = self.read();
            match (&state.identity, &state.session) {
                (Some(identity), Some(session)) => (identity.clone(), session.access_token.clone()),
                _ => return Err(AuthError::no_session()),
            }
        };
        if update.is_empty() {
            return self.load_profile(&identity).await;
        }

        let updated = self
            .profiles
            .backend()
            .update_profile(&token, identity.profile_id, update)
            .await
            .map_err(|e| self.fail(AuthOperation::Profile, &e))?;

        self.profiles.put(updated.clone());
        let mut state = self.write();
        if state.identity.as_ref().map(|i| i.user_id) == Some(identity.user_id) {
            state.profile = Some(updated.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "auth_store_test.rs"]
mod tests;
