//! Game catalog routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use super::response::{error_response, ok};
use super::status_for;
use crate::catalog::CatalogError;
use crate::error::ErrorCode;
use crate::services::session::unix_now;
use crate::state::AppState;

pub const UPCOMING_LIMIT: u32 = 20;
pub const SEARCH_DEFAULT_LIMIT: u32 = 10;

fn capture(state: &AppState, route: &'static str, err: &CatalogError) {
    tracing::warn!(route, error = %err, code = err.error_code(), "catalog request failed");
    state
        .reporter
        .capture(err, &[("component", "route".to_owned()), ("route", route.to_owned())]);
}

/// `GET /api/games/upcoming` — games releasing after now, soonest first.
pub async fn upcoming(State(state): State<AppState>) -> Response {
    match state.catalog.upcoming_games(unix_now(), UPCOMING_LIMIT).await {
        Ok(games) => Json(json!({ "games": games })).into_response(),
        Err(e) => {
            capture(&state, "games.upcoming", &e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to fetch upcoming games" })))
                .into_response()
        }
    }
}

/// `GET /api/games/test` — catalog connectivity check.
pub async fn test_connection(State(state): State<AppState>) -> Response {
    match state.catalog.ping().await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            capture(&state, "games.test", &e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false }))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<u32>,
}

/// `GET /api/games/search?q=&limit=` — title search.
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing search query", None);
    };
    let limit = params.limit.unwrap_or(SEARCH_DEFAULT_LIMIT);

    match state.catalog.search_games(query, limit).await {
        Ok(games) => ok(games),
        Err(e) => {
            capture(&state, "games.search", &e);
            error_response(status_for(e.kind()), "Failed to search games", Some(e.to_string()))
        }
    }
}

/// `GET /api/games/{id}` — one game by catalog id.
pub async fn game_by_id(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog.game_by_id(id).await {
        Ok(game) => ok(game),
        Err(CatalogError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Game not found", None),
        Err(e) => {
            capture(&state, "games.get", &e);
            error_response(status_for(e.kind()), "Failed to load game", Some(e.to_string()))
        }
    }
}
