use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::catalog::CatalogError;
use crate::catalog::mock::{MockCatalog, sample_game};

/// Catalog whose latency depends on the query, to force out-of-order replies.
struct SlowCatalog {
    delays: HashMap<&'static str, u64>,
    calls: AtomicUsize,
}

impl SlowCatalog {
    fn new(delays: &[(&'static str, u64)]) -> Self {
        Self { delays: delays.iter().copied().collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait::async_trait]
impl GameCatalog for SlowCatalog {
    async fn search_games(&self, query: &str, _limit: u32) -> Result<Vec<Game>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(query).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![sample_game(query.len() as u64, query)])
    }

    async fn upcoming_games(&self, _after: i64, _limit: u32) -> Result<Vec<Game>, CatalogError> {
        Ok(Vec::new())
    }

    async fn game_by_id(&self, id: u64) -> Result<Game, CatalogError> {
        Err(CatalogError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

fn config(min_chars: usize) -> SearchConfig {
    SearchConfig { min_chars, debounce: Duration::from_millis(300) }
}

fn store_with(catalog: Arc<dyn GameCatalog>, min_chars: usize) -> SearchStore {
    SearchStore::new(catalog, config(min_chars))
}

// =============================================================================
// minimum length
// =============================================================================

#[tokio::test]
async fn short_query_clears_results_without_dispatch() {
    let catalog = Arc::new(MockCatalog::with_games(vec![sample_game(1, "Hades")]));
    let store = store_with(catalog.clone(), 2);

    assert_eq!(store.search("Hades").await, SearchOutcome::Applied { count: 1 });
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);

    assert_eq!(store.search("H").await, SearchOutcome::Skipped);
    let state = store.snapshot();
    assert!(state.results.is_empty());
    assert!(state.results_for.is_none());
    assert!(!state.loading);
    assert_eq!(state.query, "H");
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn whitespace_does_not_count_toward_minimum() {
    let catalog = Arc::new(MockCatalog::with_games(Vec::new()));
    let store = store_with(catalog.clone(), 2);
    assert_eq!(store.search("  a  ").await, SearchOutcome::Skipped);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// results and errors
// =============================================================================

#[tokio::test]
async fn results_tagged_with_producing_query() {
    let catalog = Arc::new(MockCatalog::with_games(vec![sample_game(1, "Celeste"), sample_game(2, "Hades")]));
    let store = store_with(catalog, 2);
    store.search(" hades ").await;
    let state = store.snapshot();
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results_for.as_deref(), Some("hades"));
}

#[tokio::test]
async fn failure_recorded_in_state() {
    let catalog = Arc::new(MockCatalog::failing(CatalogError::Network("offline".into())));
    let store = store_with(catalog, 2);
    assert_eq!(store.search("doom").await, SearchOutcome::Failed(ErrorKind::NetworkFailure));
    let state = store.snapshot();
    assert_eq!(state.error, Some(ErrorKind::NetworkFailure));
    assert!(!state.loading);
    assert!(state.results.is_empty());
}

// =============================================================================
// stale-response suppression
// =============================================================================

#[tokio::test(start_paused = true)]
async fn latest_query_wins_when_replies_arrive_out_of_order() {
    let catalog = Arc::new(SlowCatalog::new(&[("a", 200), ("ab", 10)]));
    let store = store_with(catalog.clone(), 1);

    let (first, second) = tokio::join!(store.search("a"), store.search("ab"));

    assert_eq!(first, SearchOutcome::Superseded);
    assert_eq!(second, SearchOutcome::Applied { count: 1 });
    let state = store.snapshot();
    assert_eq!(state.results_for.as_deref(), Some("ab"));
    assert_eq!(state.results[0].name, "ab");
    assert!(!state.loading);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn in_order_replies_also_keep_latest() {
    let catalog = Arc::new(SlowCatalog::new(&[("a", 10), ("ab", 200)]));
    let store = store_with(catalog, 1);

    let (first, second) = tokio::join!(store.search("a"), store.search("ab"));

    assert_eq!(first, SearchOutcome::Superseded);
    assert_eq!(second, SearchOutcome::Applied { count: 1 });
    assert_eq!(store.snapshot().results_for.as_deref(), Some("ab"));
}

#[tokio::test(start_paused = true)]
async fn reset_discards_in_flight_response() {
    let catalog = Arc::new(SlowCatalog::new(&[("zelda", 100)]));
    let store = store_with(catalog, 2);

    let pending = store.search("zelda");
    let reset = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.reset();
    };
    let (outcome, ()) = tokio::join!(pending, reset);

    assert_eq!(outcome, SearchOutcome::Superseded);
    let state = store.snapshot();
    assert!(state.results.is_empty());
    assert!(state.query.is_empty());
}

// =============================================================================
// debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn debounce_only_dispatches_last_keystroke() {
    let catalog = Arc::new(SlowCatalog::new(&[]));
    let store = store_with(catalog.clone(), 1);

    let typing = async {
        let mut outcomes = Vec::new();
        for text in ["m", "ma", "mar", "mari", "mario"] {
            let store = store.clone();
            outcomes.push(tokio::spawn(async move { store.search_debounced(text).await }));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        outcomes
    };
    let handles = typing.await;
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert_eq!(outcomes[..4], [SearchOutcome::Superseded; 4]);
    assert_eq!(outcomes[4], SearchOutcome::Applied { count: 1 });
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.snapshot().results_for.as_deref(), Some("mario"));
}

// =============================================================================
// open / close / set_query
// =============================================================================

#[test]
fn set_query_is_pure_state_update() {
    let catalog = Arc::new(MockCatalog::with_games(Vec::new()));
    let store = store_with(catalog.clone(), 2);
    store.set_query("metroid");
    assert_eq!(store.snapshot().query, "metroid");
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn open_close_and_reset() {
    let catalog = Arc::new(MockCatalog::with_games(Vec::new()));
    let store = store_with(catalog, 2);
    store.open();
    assert!(store.snapshot().open);
    store.close();
    assert!(!store.snapshot().open);
    store.open();
    store.set_query("x");
    store.reset();
    let state = store.snapshot();
    assert!(!state.open);
    assert!(state.query.is_empty());
}
