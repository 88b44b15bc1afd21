//! Hosted backend client — GoTrue auth endpoints and PostgREST data endpoints.
//!
//! Thin HTTP wrapper. Response parsing lives in pure functions so it can be
//! tested without a network.

use std::time::Duration;

use reqwest::StatusCode;
use uuid::Uuid;

use super::{
    AuthBackend, BackendError, BackendUser, Credentials, DataBackend, Friend, FriendStatus, Profile,
    ProfileUpdate, Session, SignOutScope,
};
use crate::config::BackendConfig;
use crate::services::session::unix_now;

const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.url)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.url)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, BackendError> {
        let response = self
            .http
            .post(self.auth_url(&format!("token?grant_type={grant_type}")))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        parse_session(&text, unix_now())
    }
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), BackendError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    Ok((status, text))
}

#[async_trait::async_trait]
impl AuthBackend for SupabaseClient {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": credentials.email, "password": credentials.password }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str, scope: SignOutScope) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.auth_url(&format!("logout?scope={}", scope.as_str())))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        // An already-revoked token means the session is gone, which is the goal.
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(parse_error(status.as_u16(), &text))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError> {
        self.token_grant("refresh_token", serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DataBackend for SupabaseClient {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, BackendError> {
        let response = self
            .http
            .get(self.rest_url(&format!("profiles?id=eq.{user_id}&select=*")))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        parse_single_profile(&text, user_id)
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let response = self
            .http
            .patch(self.rest_url(&format!("profiles?id=eq.{user_id}")))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        parse_single_profile(&text, user_id)
    }

    async fn fetch_friends(&self, user_id: Uuid) -> Result<Vec<Friend>, BackendError> {
        let response = self
            .http
            .get(self.rest_url(&format!(
                "friends?user_id=eq.{user_id}&select=friend_id,username,avatar_url,status"
            )))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        parse_friends(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: BackendUser,
}

/// Error body. GoTrue has used two shapes over time; both are accepted.
#[derive(serde::Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct FriendRow {
    friend_id: Uuid,
    username: String,
    #[serde(default)]
    avatar_url: Option<String>,
    status: FriendStatus,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_session(json: &str, now: i64) -> Result<Session, BackendError> {
    let token: TokenResponse = serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))?;
    let expires_at = match (token.expires_at, token.expires_in) {
        (Some(at), _) => at,
        (None, Some(secs)) => now.saturating_add(secs),
        (None, None) => return Err(BackendError::Parse("token response has no expiry".into())),
    };
    Ok(Session { access_token: token.access_token, refresh_token: token.refresh_token, expires_at, user: token.user })
}

fn parse_error(status: u16, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.error_code.or(parsed.error).or_else(|| match parsed.code {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    });
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| if body.is_empty() { format!("HTTP {status}") } else { body.to_owned() });
    BackendError::Status { status, code, message }
}

fn parse_single_profile(json: &str, user_id: Uuid) -> Result<Profile, BackendError> {
    let rows: Vec<Profile> = serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))?;
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("profile {user_id}")))
}

fn parse_friends(json: &str) -> Result<Vec<Friend>, BackendError> {
    let rows: Vec<FriendRow> = serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(rows
        .into_iter()
        .map(|r| Friend { user_id: r.friend_id, username: r.username, avatar_url: r.avatar_url, status: r.status })
        .collect())
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
