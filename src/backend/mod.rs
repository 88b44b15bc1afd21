//! Backend provider — hosted auth and row-level data service.
//!
//! DESIGN
//! ======
//! Two provider-neutral async traits (`AuthBackend`, `DataBackend`) sit at the
//! seam so stores and route handlers can be exercised with mocks. The HTTP
//! implementation lives in [`supabase`].

pub mod supabase;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCode, ErrorKind};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend provider calls.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// The HTTP request could not be sent or the connection dropped.
    #[error("backend request failed: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("backend responded {status}: {message}")]
    Status { status: u16, code: Option<String>, message: String },

    /// The provider response body could not be deserialized.
    #[error("backend response parse failed: {0}")]
    Parse(String),

    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_BACKEND_NETWORK",
            Self::Status { .. } => "E_BACKEND_STATUS",
            Self::Parse(_) => "E_BACKEND_PARSE",
            Self::NotFound(_) => "E_BACKEND_NOT_FOUND",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Status { status: 429, .. } => ErrorKind::RateLimited,
            Self::Status { status: 401 | 403, .. } => ErrorKind::InvalidSession,
            Self::NotFound(_) | Self::Status { status: 404, .. } => ErrorKind::NotFound,
            _ => ErrorKind::Unknown,
        }
    }
}

// =============================================================================
// AUTH TYPES
// =============================================================================

/// Email/password credentials for the password grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// User record embedded in a provider session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Provider-issued session. Mirrored read-only by the auth store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as unix seconds.
    pub expires_at: i64,
    pub user: BackendUser,
}

/// Which sessions a sign-out revokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignOutScope {
    /// Only the current session.
    #[default]
    Local,
    /// Every session of the user.
    Global,
    /// Every session except the current one.
    Others,
}

impl SignOutScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Others => "others",
        }
    }
}

// =============================================================================
// DATA TYPES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileStats {
    #[serde(default)]
    pub games_played: i64,
    #[serde(default)]
    pub reviews_written: i64,
    #[serde(default)]
    pub friends_count: i64,
}

/// User-facing profile row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub stats: ProfileStats,
}

fn default_role() -> String {
    "user".to_owned()
}

/// Partial profile edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.display_name.is_none() && self.avatar_url.is_none() && self.bio.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    pub user_id: Uuid,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub status: FriendStatus,
}

// =============================================================================
// TRAITS
// =============================================================================

/// Provider-neutral auth API. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email/password for a session.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError>;

    /// Revoke sessions for the given access token.
    async fn sign_out(&self, access_token: &str, scope: SignOutScope) -> Result<(), BackendError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError>;

    /// Resolve the user an access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError>;
}

/// Provider-neutral row-level data API.
#[async_trait::async_trait]
pub trait DataBackend: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, BackendError>;

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError>;

    async fn fetch_friends(&self, user_id: Uuid) -> Result<Vec<Friend>, BackendError>;
}

#[cfg(test)]
pub mod mock;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
