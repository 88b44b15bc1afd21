//! Filter store — category/platform/search filters for catalog views.
//!
//! Purely synchronous; nothing here persists or talks to the network.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub category: String,
    pub platform: String,
    pub search: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self { category: ALL.to_owned(), platform: ALL.to_owned(), search: String::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKey {
    Category,
    Platform,
    Search,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown filter key: {0}")]
pub struct UnknownFilterKey(pub String);

impl std::str::FromStr for FilterKey {
    type Err = UnknownFilterKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "platform" => Ok(Self::Platform),
            "search" => Ok(Self::Search),
            other => Err(UnknownFilterKey(other.to_owned())),
        }
    }
}

#[derive(Clone, Default)]
pub struct FilterStore {
    state: Arc<Mutex<FilterState>>,
}

impl FilterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FilterState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Merge one field; every other field keeps its value.
    pub fn update_filter(&self, key: FilterKey, value: impl Into<String>) {
        let value = value.into();
        let mut state = self.lock();
        match key {
            FilterKey::Category => state.category = value,
            FilterKey::Platform => state.platform = value,
            FilterKey::Search => state.search = value,
        }
    }

    pub fn reset_filters(&self) {
        *self.lock() = FilterState::default();
    }

    #[must_use]
    pub fn snapshot(&self) -> FilterState {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self.lock() == FilterState::default()
    }
}
