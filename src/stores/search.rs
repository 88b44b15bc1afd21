//! Global search store — query text, results and the dispatch that fills them.
//!
//! DESIGN
//! ======
//! Every dispatch (and every state change that should invalidate in-flight
//! work) bumps `seq` under the lock. A response is applied only if `seq` has
//! not moved since its request was issued, so when two searches overlap the
//! most recently issued one wins regardless of arrival order.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::catalog::{Game, GameCatalog};
use crate::config::SearchConfig;
use crate::error::{ErrorCode, ErrorKind};

pub const DEFAULT_RESULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Game>,
    /// The query `results` belong to. `None` whenever `results` is empty by reset.
    pub results_for: Option<String>,
    pub loading: bool,
    pub open: bool,
    pub error: Option<ErrorKind>,
    #[serde(skip)]
    seq: u64,
}

/// What a call to [`SearchStore::search`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Query below the minimum length; results cleared, nothing dispatched.
    Skipped,
    /// Results applied to state.
    Applied { count: usize },
    /// A newer search was issued; this response was discarded.
    Superseded,
    /// The dispatch failed and the error was recorded in state.
    Failed(ErrorKind),
}

#[derive(Clone)]
pub struct SearchStore {
    catalog: Arc<dyn GameCatalog>,
    config: SearchConfig,
    limit: u32,
    state: Arc<Mutex<SearchState>>,
}

impl SearchStore {
    #[must_use]
    pub fn new(catalog: Arc<dyn GameCatalog>, config: SearchConfig) -> Self {
        Self { catalog, config, limit: DEFAULT_RESULT_LIMIT, state: Arc::new(Mutex::new(SearchState::default())) }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchState {
        self.lock().clone()
    }

    /// Pure state update of the input text.
    pub fn set_query(&self, text: impl Into<String>) {
        self.lock().query = text.into();
    }

    pub fn open(&self) {
        self.lock().open = true;
    }

    pub fn close(&self) {
        self.lock().open = false;
    }

    /// Clear everything and discard any in-flight response.
    pub fn reset(&self) {
        let mut state = self.lock();
        let seq = state.seq + 1;
        *state = SearchState { seq, ..SearchState::default() };
    }

    /// Dispatch a search for `text`.
    ///
    /// Text shorter than the configured minimum (after trimming) clears the
    /// results without any network call.
    pub async fn search(&self, text: &str) -> SearchOutcome {
        let query = text.trim().to_owned();
        let seq = {
            let mut state = self.lock();
            state.seq += 1;
            state.query = text.to_owned();
            state.error = None;
            if query.chars().count() < self.config.min_chars {
                state.results.clear();
                state.results_for = None;
                state.loading = false;
                return SearchOutcome::Skipped;
            }
            state.loading = true;
            state.seq
        };

        let result = self.catalog.search_games(&query, self.limit).await;

        let mut state = self.lock();
        if state.seq != seq {
            tracing::debug!(%query, "discarding superseded search response");
            return SearchOutcome::Superseded;
        }
        state.loading = false;
        match result {
            Ok(games) => {
                let count = games.len();
                state.results = games;
                state.results_for = Some(query);
                SearchOutcome::Applied { count }
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "search dispatch failed");
                state.results.clear();
                state.results_for = None;
                state.error = Some(e.kind());
                SearchOutcome::Failed(e.kind())
            }
        }
    }

    /// Wait out the debounce window, then search unless a newer call arrived.
    pub async fn search_debounced(&self, text: &str) -> SearchOutcome {
        self.search_after(text, self.config.debounce).await
    }

    /// [`SearchStore::search_debounced`] with an explicit delay.
    pub async fn search_after(&self, text: &str, delay: Duration) -> SearchOutcome {
        let ticket = {
            let mut state = self.lock();
            state.seq += 1;
            state.query = text.to_owned();
            state.seq
        };
        tokio::time::sleep(delay).await;
        if self.lock().seq != ticket {
            return SearchOutcome::Superseded;
        }
        self.search(text).await
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
