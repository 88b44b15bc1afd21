//! Game catalog — external metadata API (titles, covers, release dates).

pub mod igdb;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ErrorKind};

/// Errors produced by catalog API calls.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Network(String),

    #[error("catalog responded {status}")]
    Status { status: u16, body: String },

    #[error("catalog response parse failed: {0}")]
    Parse(String),

    #[error("game not found: {0}")]
    NotFound(u64),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_CATALOG_NETWORK",
            Self::Status { .. } => "E_CATALOG_STATUS",
            Self::Parse(_) => "E_CATALOG_PARSE",
            Self::NotFound(_) => "E_CATALOG_NOT_FOUND",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Status { status: 429, .. } => ErrorKind::RateLimited,
            Self::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Unknown,
        }
    }
}

/// Game metadata as exposed to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: u64,
    pub name: String,
    pub cover_url: Option<String>,
    /// Release date as unix seconds.
    pub first_release_date: Option<i64>,
    pub rating: Option<f64>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub summary: Option<String>,
}

/// Provider-neutral catalog API. Enables mocking in tests.
#[async_trait::async_trait]
pub trait GameCatalog: Send + Sync {
    /// Full-text search by title.
    async fn search_games(&self, query: &str, limit: u32) -> Result<Vec<Game>, CatalogError>;

    /// Games releasing after `after` (unix seconds), soonest first.
    async fn upcoming_games(&self, after: i64, limit: u32) -> Result<Vec<Game>, CatalogError>;

    /// Look up one game by catalog id.
    async fn game_by_id(&self, id: u64) -> Result<Game, CatalogError>;

    /// Cheapest possible authenticated request, used for connectivity checks.
    async fn ping(&self) -> Result<(), CatalogError>;
}
