//! Profile cache — time- and size-bounded map of user id to profile row.
//!
//! DESIGN
//! ======
//! Entries expire after a fixed ttl and are refetched, never served stale.
//! Concurrent misses for the same id are coalesced: the first caller installs
//! a shared in-flight fetch in `pending` and every other caller awaits the
//! same future, so the backend sees one request per id.
//!
//! INVARIANTS
//! ==========
//! A fetch may only populate the cache if its `pending` slot is still the one
//! it installed. `invalidate` and `clear` drop pending slots, so a fetch that
//! started before a sign-out cannot write a profile back afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::{BackendError, DataBackend, Profile};
use crate::config::ProfileCacheConfig;
use crate::error::{ErrorCode, ErrorKind};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Backend(BackendError),
}

impl ProfileError {
    fn from_backend(user_id: Uuid, err: BackendError) -> Self {
        match err {
            BackendError::NotFound(_) | BackendError::Status { status: 404, .. } => Self::NotFound(user_id),
            other => Self::Backend(other),
        }
    }
}

impl ErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_PROFILE_NOT_FOUND",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Backend(e) => e.kind(),
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Profile, ProfileError>>>;

#[derive(Debug, Clone)]
struct CachedProfile {
    profile: Profile,
    fetched_at: Instant,
}

struct PendingFetch {
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Uuid, CachedProfile>,
    pending: HashMap<Uuid, PendingFetch>,
}

struct Inner {
    backend: Arc<dyn DataBackend>,
    config: ProfileCacheConfig,
    state: Mutex<CacheState>,
    next_fetch_id: AtomicU64,
}

/// Shared handle; clones see the same entries.
#[derive(Clone)]
pub struct ProfileCache {
    inner: Arc<Inner>,
}

impl ProfileCache {
    #[must_use]
    pub fn new(backend: Arc<dyn DataBackend>, config: ProfileCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Mutex::new(CacheState::default()),
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CachedProfile, now: Instant) -> bool {
        now.duration_since(entry.fetched_at) < self.inner.config.ttl
    }

    /// Return the cached profile if fresh, otherwise fetch it.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if the backend has no such profile,
    /// or [`ProfileError::Backend`] for any other provider failure. Failures
    /// are never cached.
    pub async fn get(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        let (fetch_id, fetch) = {
            let mut state = self.lock();
            let now = Instant::now();
            let fresh = state
                .entries
                .get(&user_id)
                .filter(|entry| self.is_fresh(entry, now))
                .map(|entry| entry.profile.clone());
            if let Some(profile) = fresh {
                return Ok(profile);
            }
            state.entries.remove(&user_id);

            if let Some(pending) = state.pending.get(&user_id) {
                (pending.id, pending.fetch.clone())
            } else {
                let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let backend = Arc::clone(&self.inner.backend);
                let fetch = async move {
                    tracing::debug!(%user_id, "fetching profile");
                    backend
                        .fetch_profile(user_id)
                        .await
                        .map_err(|e| ProfileError::from_backend(user_id, e))
                }
                .boxed()
                .shared();
                state.pending.insert(user_id, PendingFetch { id, fetch: fetch.clone() });
                (id, fetch)
            }
        };

        let result = fetch.await;
        self.settle(user_id, fetch_id, &result);
        result
    }

    /// Retire the pending slot and, on success, store the profile. Only the
    /// first waiter to arrive finds its slot; later waiters are no-ops.
    fn settle(&self, user_id: Uuid, fetch_id: u64, result: &Result<Profile, ProfileError>) {
        let mut state = self.lock();
        let owns_slot = state
            .pending
            .get(&user_id)
            .is_some_and(|p| p.id == fetch_id);
        if !owns_slot {
            return;
        }
        state.pending.remove(&user_id);
        if let Ok(profile) = result {
            self.insert_locked(&mut state, profile.clone(), Instant::now());
        }
    }

    fn insert_locked(&self, state: &mut CacheState, profile: Profile, now: Instant) {
        let capacity = self.inner.config.capacity;
        if capacity == 0 {
            return;
        }
        if !state.entries.contains_key(&profile.id) && state.entries.len() >= capacity {
            let ttl = self.inner.config.ttl;
            state
                .entries
                .retain(|_, entry| now.duration_since(entry.fetched_at) < ttl);
            if state.entries.len() >= capacity {
                let oldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(id, _)| *id);
                if let Some(oldest) = oldest {
                    tracing::debug!(user_id = %oldest, "evicting oldest profile");
                    state.entries.remove(&oldest);
                }
            }
        }
        state.entries.insert(profile.id, CachedProfile { profile, fetched_at: now });
    }

    /// Store a profile obtained elsewhere (e.g. returned by a profile edit).
    pub fn put(&self, profile: Profile) {
        let mut state = self.lock();
        state.pending.remove(&profile.id);
        self.insert_locked(&mut state, profile, Instant::now());
    }

    /// Fresh cached profile, without fetching.
    #[must_use]
    pub fn peek(&self, user_id: Uuid) -> Option<Profile> {
        let state = self.lock();
        state
            .entries
            .get(&user_id)
            .filter(|entry| self.is_fresh(entry, Instant::now()))
            .map(|entry| entry.profile.clone())
    }

    /// Drop one entry and any in-flight fetch for it.
    pub fn invalidate(&self, user_id: Uuid) {
        let mut state = self.lock();
        state.entries.remove(&user_id);
        state.pending.remove(&user_id);
    }

    /// Drop every entry and every in-flight fetch.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.pending.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The data backend profiles are fetched from.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn DataBackend> {
        Arc::clone(&self.inner.backend)
    }

    #[must_use]
    pub fn config(&self) -> ProfileCacheConfig {
        self.inner.config
    }
}

#[cfg(test)]
#[path = "profile_cache_test.rs"]
mod tests;
