//! In-memory progress store backed by DashMap.
//!
//! Used by tests and `--ephemeral` sessions. All data is lost on process exit.

use dashmap::DashMap;

use super::{ProgressStore, StoreResult, is_progress_key};

/// Concurrent in-memory store using a sharded hashmap.
#[derive(Debug, Default)]
pub struct MemProgressStore {
    data: DashMap<String, String>,
}

impl MemProgressStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ProgressStore for MemProgressStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> StoreResult<()> {
        self.data.remove(key);
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let mut entries: Vec<_> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn clear(&self) -> StoreResult<usize> {
        let before = self.data.len();
        self.data.retain(|key, _| !is_progress_key(key));
        Ok(before - self.data.len())
    }
}
