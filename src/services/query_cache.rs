//! Request/query cache — prior fetch results keyed by a segment path.
//!
//! Keys are ordered string segments (`["games", "upcoming"]`) so a whole
//! family of entries can be dropped with one prefix. The cache holds
//! per-identity data and must be emptied whenever the signed-in user changes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The narrow handle the auth store needs to wipe per-user data on sign-out.
pub trait RequestCache: Send + Sync {
    fn clear(&self);

    fn is_empty(&self) -> bool;
}

pub type QueryKey = Vec<String>;

/// Build a [`QueryKey`] from string-like segments.
#[must_use]
pub fn query_key<I, S>(segments: I) -> QueryKey
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    segments.into_iter().map(Into::into).collect()
}

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, serde_json::Value>>>,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &[String]) -> Option<serde_json::Value> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Typed read; a value that no longer deserializes is treated as a miss.
    #[must_use]
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &[String]) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set(&self, key: QueryKey, value: serde_json::Value) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, value);
    }

    /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &[String]) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

impl RequestCache for QueryCache {
    fn clear(&self) {
        QueryCache::clear(self);
    }

    fn is_empty(&self) -> bool {
        QueryCache::is_empty(self)
    }
}
