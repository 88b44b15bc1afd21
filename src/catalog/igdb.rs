//! IGDB client — APIcalypse queries against the `/games` endpoint.
//!
//! Query construction and response parsing are pure functions; the client
//! only attaches credentials and moves bytes.

use std::time::Duration;

use super::{CatalogError, Game, GameCatalog};
use crate::config::CatalogConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const GAME_FIELDS: &str =
    "name,cover.url,first_release_date,total_rating,platforms.name,genres.name,summary";
/// IGDB rejects result windows above this.
pub const MAX_LIMIT: u32 = 500;

// =============================================================================
// CLIENT
// =============================================================================

pub struct IgdbClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    access_token: String,
}

impl IgdbClient {
    /// Build a client from catalog credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig, timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client_id: config.client_id.clone(),
            access_token: config.access_token.clone(),
        })
    }

    async fn query_games(&self, body: String) -> Result<Vec<Game>, CatalogError> {
        let response = self
            .http
            .post(format!("{}/games", self.base_url))
            .header("Client-ID", &self.client_id)
            .header("Accept", "application/json")
            .bearer_auth(&self.access_token)
            .body(body)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(CatalogError::Status { status, body: text });
        }

        parse_games(&text)
    }
}

#[async_trait::async_trait]
impl GameCatalog for IgdbClient {
    async fn search_games(&self, query: &str, limit: u32) -> Result<Vec<Game>, CatalogError> {
        self.query_games(search_query(query, limit)).await
    }

    async fn upcoming_games(&self, after: i64, limit: u32) -> Result<Vec<Game>, CatalogError> {
        self.query_games(upcoming_query(after, limit)).await
    }

    async fn game_by_id(&self, id: u64) -> Result<Game, CatalogError> {
        self.query_games(by_id_query(id))
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        self.query_games("fields id; limit 1;".to_owned())
            .await
            .map(|_| ())
    }
}

// =============================================================================
// QUERIES
// =============================================================================

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// Escape a user string for use inside an APIcalypse string literal.
fn escape(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            other => vec![other],
        })
        .collect()
}

fn search_query(query: &str, limit: u32) -> String {
    format!(
        "search \"{}\"; fields {GAME_FIELDS}; limit {};",
        escape(query.trim()),
        clamp_limit(limit)
    )
}

fn upcoming_query(after: i64, limit: u32) -> String {
    format!(
        "fields {GAME_FIELDS}; where first_release_date > {after} & cover != null; sort first_release_date asc; limit {};",
        clamp_limit(limit)
    )
}

fn by_id_query(id: u64) -> String {
    format!("fields {GAME_FIELDS}; where id = {id}; limit 1;")
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct ApiGame {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cover: Option<ApiCover>,
    #[serde(default)]
    first_release_date: Option<i64>,
    #[serde(default)]
    total_rating: Option<f64>,
    #[serde(default)]
    platforms: Vec<ApiNamed>,
    #[serde(default)]
    genres: Vec<ApiNamed>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(serde::Deserialize)]
struct ApiCover {
    #[serde(default)]
    url: Option<String>,
}

#[derive(serde::Deserialize)]
struct ApiNamed {
    #[serde(default)]
    name: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_games(json: &str) -> Result<Vec<Game>, CatalogError> {
    let rows: Vec<ApiGame> = serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
    Ok(rows
        .into_iter()
        .map(|g| Game {
            id: g.id,
            name: g.name.unwrap_or_else(|| format!("Game #{}", g.id)),
            cover_url: g.cover.and_then(|c| c.url).map(|u| cover_url(&u)),
            first_release_date: g.first_release_date,
            rating: g.total_rating.map(|r| (r * 10.0).round() / 10.0),
            platforms: g.platforms.into_iter().filter_map(|p| p.name).collect(),
            genres: g.genres.into_iter().filter_map(|p| p.name).collect(),
            summary: g.summary,
        })
        .collect())
}

/// Catalog cover URLs are protocol-relative thumbnails; upgrade to https and
/// the large cover size.
fn cover_url(raw: &str) -> String {
    let absolute = if raw.starts_with("//") { format!("https:{raw}") } else { raw.to_owned() };
    absolute.replace("/t_thumb/", "/t_cover_big/")
}

#[cfg(test)]
#[path = "igdb_test.rs"]
mod tests;
