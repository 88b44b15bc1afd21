//! Friends list store.
//!
//! Every `load` and every `clear` bumps the sequence number. A response is
//! applied only if no newer load or clear happened while it was in flight,
//! so overlapping loads resolve to the one issued last.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

use crate::backend::{BackendError, DataBackend, Friend, FriendStatus};
use crate::error::{ErrorCode, ErrorKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FriendsState {
    pub friends: Vec<Friend>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
    #[serde(skip)]
    seq: u64,
}

/// What a call to [`FriendsStore::load`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with this many friends.
    Loaded(usize),
    /// A newer load or a clear was issued; this response was discarded.
    Superseded,
}

#[derive(Clone, Default)]
pub struct FriendsStore {
    state: Arc<Mutex<FriendsState>>,
}

impl FriendsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FriendsState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> FriendsState {
        self.lock().clone()
    }

    /// Replace the list with the backend's current rows for `user_id`.
    ///
    /// On failure the previous list is kept and the error kind is recorded.
    /// A superseded response, success or failure, leaves state untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend error when this load was still the latest.
    pub async fn load(&self, backend: &dyn DataBackend, user_id: Uuid) -> Result<LoadOutcome, BackendError> {
        let seq = {
            let mut state = self.lock();
            state.seq += 1;
            state.loading = true;
            state.error = None;
            state.seq
        };

        let result = backend.fetch_friends(user_id).await;

        let mut state = self.lock();
        if state.seq != seq {
            tracing::debug!(%user_id, "discarding superseded friends list");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;
        match result {
            Ok(friends) => {
                let count = friends.len();
                state.friends = friends;
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, code = e.error_code(), "friends load failed");
                state.error = Some(e.kind());
                Err(e)
            }
        }
    }

    /// Insert `friend`, or replace the entry with the same `user_id`.
    pub fn upsert(&self, friend: Friend) {
        let mut state = self.lock();
        match state.friends.iter_mut().find(|f| f.user_id == friend.user_id) {
            Some(existing) => *existing = friend,
            None => state.friends.push(friend),
        }
    }

    /// Returns `false` when no such friend is listed.
    pub fn set_status(&self, user_id: Uuid, status: FriendStatus) -> bool {
        let mut state = self.lock();
        match state.friends.iter_mut().find(|f| f.user_id == user_id) {
            Some(friend) => {
                friend.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, user_id: Uuid) -> Option<Friend> {
        let mut state = self.lock();
        let idx = state.friends.iter().position(|f| f.user_id == user_id)?;
        Some(state.friends.remove(idx))
    }

    #[must_use]
    pub fn accepted(&self) -> Vec<Friend> {
        self.with_status(FriendStatus::Accepted)
    }

    #[must_use]
    pub fn pending(&self) -> Vec<Friend> {
        self.with_status(FriendStatus::Pending)
    }

    fn with_status(&self, status: FriendStatus) -> Vec<Friend> {
        self.lock()
            .friends
            .iter()
            .filter(|f| f.status == status)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let seq = state.seq + 1;
        *state = FriendsState { seq, ..FriendsState::default() };
    }
}
