//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the provider clients behind their traits plus the profile cache
//! shared by every request.

use std::sync::Arc;

use crate::backend::{AuthBackend, DataBackend};
use crate::catalog::GameCatalog;
use crate::config::ProfileCacheConfig;
use crate::services::profile_cache::ProfileCache;
use crate::telemetry::ErrorReporter;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is Arc-wrapped or a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthBackend>,
    pub catalog: Arc<dyn GameCatalog>,
    pub profiles: ProfileCache,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl AppState {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        data: Arc<dyn DataBackend>,
        catalog: Arc<dyn GameCatalog>,
        reporter: Arc<dyn ErrorReporter>,
        profile_cache: ProfileCacheConfig,
    ) -> Self {
        Self { auth, catalog, profiles: ProfileCache::new(data, profile_cache), reporter }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use uuid::Uuid;

    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::catalog::mock::{MockCatalog, sample_game};
    use crate::telemetry::MemoryReporter;

    pub struct TestApp {
        pub state: AppState,
        pub user_id: Uuid,
        pub backend: Arc<MockBackend>,
        pub catalog: Arc<MockCatalog>,
        pub reporter: MemoryReporter,
    }

    /// `AppState` over in-memory mocks: one known user with a profile and a
    /// small catalog.
    #[must_use]
    pub fn test_app() -> TestApp {
        test_app_with_catalog(MockCatalog::with_games(vec![
            sample_game(1, "Hollow Knight: Silksong"),
            sample_game(2, "Hades II"),
            sample_game(3, "Metroid Prime 4"),
        ]))
    }

    #[must_use]
    pub fn test_app_with_catalog(catalog: MockCatalog) -> TestApp {
        let user_id = Uuid::new_v4();
        let backend = Arc::new(MockBackend::for_user(user_id));
        let catalog = Arc::new(catalog);
        let reporter = MemoryReporter::new();
        let state = AppState::new(
            backend.clone(),
            backend.clone(),
            catalog.clone(),
            Arc::new(reporter.clone()),
            ProfileCacheConfig::default(),
        );
        TestApp { state, user_id, backend, catalog, reporter }
    }
}
