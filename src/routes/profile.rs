//! Profile routes, served through the shared profile cache.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use uuid::Uuid;

use super::response::{error_response, ok};
use super::status_for;
use crate::error::ErrorCode;
use crate::services::profile_cache::ProfileError;
use crate::state::AppState;

/// `GET /api/profile/{id}`
pub async fn get_profile(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Response {
    match state.profiles.get(user_id).await {
        Ok(profile) => ok(profile),
        Err(ProfileError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Profile not found", None),
        Err(e) => {
            tracing::warn!(%user_id, error = %e, code = e.error_code(), "profile fetch failed");
            state
                .reporter
                .capture(&e, &[("component", "route".to_owned()), ("route", "profile.get".to_owned())]);
            error_response(status_for(e.kind()), "Failed to load profile", Some(e.to_string()))
        }
    }
}
