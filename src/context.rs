//! Client application context.
//!
//! DESIGN
//! ======
//! One `AppContext` per client session owns every store plus the request
//! cache. Nothing in the crate is a process-wide singleton; code that needs a
//! store is handed the context (or a clone of the store handle).

use std::sync::Arc;

use crate::backend::{AuthBackend, Credentials, DataBackend, SignOutScope};
use crate::catalog::GameCatalog;
use crate::config::{Config, ProfileCacheConfig, SearchConfig};
use crate::error::{ErrorCode, ErrorKind};
use crate::services::auth_store::{AuthError, AuthSnapshot, AuthStore};
use crate::services::profile_cache::ProfileCache;
use crate::services::query_cache::QueryCache;
use crate::stores::filter::FilterStore;
use crate::stores::friends::{FriendsStore, LoadOutcome};
use crate::stores::search::SearchStore;
use crate::stores::theme::{Theme, ThemeStore};
use crate::telemetry::ErrorReporter;

/// Provider handles a context is built from.
#[derive(Clone)]
pub struct Providers {
    pub auth: Arc<dyn AuthBackend>,
    pub data: Arc<dyn DataBackend>,
    pub catalog: Arc<dyn GameCatalog>,
    pub reporter: Arc<dyn ErrorReporter>,
}

#[derive(Clone)]
pub struct AppContext {
    data: Arc<dyn DataBackend>,
    pub auth: AuthStore,
    pub queries: QueryCache,
    pub search: SearchStore,
    pub filters: FilterStore,
    pub theme: ThemeStore,
    pub friends: FriendsStore,
}

impl AppContext {
    #[must_use]
    pub fn new(providers: Providers, profile_cache: ProfileCacheConfig, search: SearchConfig) -> Self {
        let profiles = ProfileCache::new(Arc::clone(&providers.data), profile_cache);
        Self {
            data: providers.data,
            auth: AuthStore::new(providers.auth, profiles, providers.reporter),
            queries: QueryCache::new(),
            search: SearchStore::new(providers.catalog, search),
            filters: FilterStore::new(),
            theme: ThemeStore::new(Theme::System),
            friends: FriendsStore::new(),
        }
    }

    /// Context tuned by the profile cache and search settings of `config`.
    #[must_use]
    pub fn from_config(providers: Providers, config: &Config) -> Self {
        Self::new(providers, config.profile_cache, config.search)
    }

    /// Load the signed-in user's friends into the friends store.
    ///
    /// # Errors
    ///
    /// Returns `invalid_session` when signed out, or the kind of the fetch failure.
    pub async fn load_friends(&self) -> Result<LoadOutcome, ErrorKind> {
        let identity = self.auth.identity().ok_or(ErrorKind::InvalidSession)?;
        self.friends
            .load(self.data.as_ref(), identity.user_id)
            .await
            .map_err(|e| e.kind())
    }

    /// Sign in, resetting per-user stores when the account differs from the
    /// one already signed in.
    ///
    /// # Errors
    ///
    /// Returns the error from [`AuthStore::sign_in`]; stores are untouched
    /// when sign-in fails.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSnapshot, AuthError> {
        let before = self.auth.identity().map(|i| i.user_id);
        let snapshot = self.auth.sign_in(credentials).await?;
        let after = snapshot.identity.as_ref().map(|i| i.user_id);
        if before.is_some() && before != after {
            self.queries.clear();
            self.reset_user_data();
        }
        Ok(snapshot)
    }

    /// Sign out and reset every store that holds per-user data.
    ///
    /// Theme is a device preference and survives.
    ///
    /// # Errors
    ///
    /// Returns the provider error from [`AuthStore::sign_out`]; the stores are
    /// reset either way.
    pub async fn sign_out(&self, scope: SignOutScope) -> Result<(), AuthError> {
        let result = self.auth.sign_out(scope, &self.queries).await;
        self.reset_user_data();
        result
    }

    fn reset_user_data(&self) {
        self.search.reset();
        self.filters.reset_filters();
        self.friends.clear();
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::backend::mock::{FAR_FUTURE, MockBackend, sample_profile, sample_session};
    use crate::backend::{BackendError, Credentials, Friend, FriendStatus};
    use crate::catalog::mock::{MockCatalog, sample_game};
    use crate::services::query_cache::query_key;
    use crate::stores::filter::{FilterKey, FilterState};
    use crate::stores::search::SearchOutcome;
    use crate::telemetry::MemoryReporter;

    fn providers(backend: &Arc<MockBackend>) -> Providers {
        Providers {
            auth: backend.clone(),
            data: backend.clone(),
            catalog: Arc::new(MockCatalog::with_games(vec![sample_game(1, "Hollow Knight")])),
            reporter: Arc::new(MemoryReporter::new()),
        }
    }

    fn context() -> (Uuid, Arc<MockBackend>, AppContext) {
        let user_id = Uuid::new_v4();
        let backend = Arc::new(MockBackend::for_user(user_id));
        *backend.friends.lock().unwrap() = Ok(vec![Friend {
            user_id: Uuid::new_v4(),
            username: "ana".into(),
            avatar_url: None,
            status: FriendStatus::Accepted,
        }]);
        let ctx = AppContext::new(providers(&backend), ProfileCacheConfig::default(), SearchConfig::default());
        (user_id, backend, ctx)
    }

    fn creds() -> Credentials {
        Credentials { email: "player@gamerfie.test".into(), password: "hunter22".into() }
    }

    #[tokio::test]
    async fn sign_out_resets_every_per_user_store() {
        let (_, _, ctx) = context();
        ctx.auth.sign_in(&creds()).await.unwrap();
        assert_eq!(ctx.load_friends().await, Ok(LoadOutcome::Loaded(1)));
        ctx.search.search("hollow").await;
        ctx.filters.update_filter(FilterKey::Platform, "switch");
        ctx.queries.set(query_key(["games", "upcoming"]), serde_json::json!([]));
        ctx.theme.set_theme(Theme::Dark);

        ctx.sign_out(SignOutScope::Local).await.unwrap();

        assert!(!ctx.auth.is_authenticated());
        assert!(ctx.auth.profile_cache().is_empty());
        assert!(ctx.queries.is_empty());
        assert!(ctx.search.snapshot().results.is_empty());
        assert_eq!(ctx.filters.snapshot(), FilterState::default());
        assert!(ctx.friends.snapshot().friends.is_empty());
        assert_eq!(ctx.theme.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn sign_out_resets_stores_when_provider_fails() {
        let (_, backend, ctx) = context();
        ctx.auth.sign_in(&creds()).await.unwrap();
        ctx.filters.update_filter(FilterKey::Category, "rpg");
        *backend.sign_out_result.lock().unwrap() = Err(BackendError::Network("offline".into()));

        let err = ctx.sign_out(SignOutScope::Global).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NetworkFailure);
        assert!(ctx.filters.is_default());
        assert!(!ctx.auth.is_authenticated());
    }

    #[tokio::test]
    async fn signing_in_as_another_user_drops_previous_user_data() {
        let (first_user, backend, ctx) = context();
        ctx.sign_in(&creds()).await.unwrap();
        ctx.load_friends().await.unwrap();
        ctx.search.search("hollow").await;
        ctx.filters.update_filter(FilterKey::Platform, "switch");
        ctx.queries.set(query_key(["me", "lists"]), serde_json::json!(["backlog"]));
        ctx.theme.set_theme(Theme::Dark);

        let second_user = Uuid::new_v4();
        backend.insert_profile(sample_profile(second_user));
        *backend.sign_in_result.lock().unwrap() = Ok(sample_session(second_user, FAR_FUTURE));
        *backend.friends.lock().unwrap() = Ok(Vec::new());
        let snapshot = ctx.sign_in(&creds()).await.unwrap();

        assert_eq!(snapshot.identity.unwrap().user_id, second_user);
        assert!(ctx.queries.is_empty());
        assert!(ctx.friends.snapshot().friends.is_empty());
        assert!(ctx.search.snapshot().results.is_empty());
        assert!(ctx.filters.is_default());
        assert!(ctx.auth.profile_cache().peek(first_user).is_none());
        assert!(ctx.auth.profile_cache().peek(second_user).is_some());
        assert_eq!(ctx.theme.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn signing_in_again_as_same_user_keeps_data() {
        let (_, _, ctx) = context();
        ctx.sign_in(&creds()).await.unwrap();
        ctx.load_friends().await.unwrap();
        ctx.queries.set(query_key(["me", "lists"]), serde_json::json!(["backlog"]));

        ctx.sign_in(&creds()).await.unwrap();

        assert!(!ctx.queries.is_empty());
        assert_eq!(ctx.friends.snapshot().friends.len(), 1);
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_current_user_data() {
        let (_, backend, ctx) = context();
        ctx.sign_in(&creds()).await.unwrap();
        ctx.load_friends().await.unwrap();
        *backend.sign_in_result.lock().unwrap() = Err(BackendError::Network("offline".into()));

        assert!(ctx.sign_in(&creds()).await.is_err());

        assert!(ctx.auth.is_authenticated());
        assert_eq!(ctx.friends.snapshot().friends.len(), 1);
    }

    #[tokio::test]
    async fn from_config_applies_search_settings() {
        let vars = [
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("IGDB_CLIENT_ID", "client"),
            ("IGDB_ACCESS_TOKEN", "token"),
            ("SEARCH_MIN_CHARS", "5"),
        ];
        let config = Config::from_lookup(|key| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
        })
        .unwrap();
        let backend = Arc::new(MockBackend::for_user(Uuid::new_v4()));
        let ctx = AppContext::from_config(providers(&backend), &config);

        assert_eq!(ctx.search.search("holl").await, SearchOutcome::Skipped);
        assert!(matches!(ctx.search.search("hollow").await, SearchOutcome::Applied { count: 1 }));
    }

    #[tokio::test]
    async fn load_friends_requires_session() {
        let (_, _, ctx) = context();
        assert_eq!(ctx.load_friends().await, Err(ErrorKind::InvalidSession));
    }

    #[tokio::test]
    async fn contexts_are_independent() {
        let (_, _, first) = context();
        let (_, _, second) = context();
        first.auth.sign_in(&creds()).await.unwrap();
        first.filters.update_filter(FilterKey::Search, "metroid");
        assert!(!second.auth.is_authenticated());
        assert!(second.filters.is_default());
    }
}
