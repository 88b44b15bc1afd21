//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Thin JSON endpoints between the UI and the two external providers. Handlers
//! translate; they hold no business logic beyond mapping errors to statuses.

pub mod auth;
pub mod games;
pub mod profile;
pub mod response;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ErrorKind;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/games/upcoming", get(games::upcoming))
        .route("/api/games/test", get(games::test_connection))
        .route("/api/games/search", get(games::search))
        .route("/api/games/{id}", get(games::game_by_id))
        .route("/api/auth/session", get(auth::session))
        .route("/api/profile/{id}", get(profile::get_profile))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP status for a taxonomy kind.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidSession | ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::NetworkFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
