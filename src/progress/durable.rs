//! ACID-durable progress store backed by redb.
//!
//! Every write is its own transaction, and a batch shares one, so a crash never
//! leaves a half-written record or a half-applied batch. Reads use MVCC snapshots.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use super::{ProgressStore, StoreResult, is_progress_key};
use crate::error::StoreError;

/// Progress key → raw string value.
const PROGRESS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("progress");

const DB_FILE: &str = "trailmap.redb";

/// Durable store using redb.
pub struct DurableProgressStore {
    db: Arc<Database>,
}

fn redb_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

impl DurableProgressStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Create the table up front so read transactions never see it missing.
        let txn = db.begin_write().map_err(|e| redb_err("begin_write", e))?;
        txn.open_table(PROGRESS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        txn.commit().map_err(|e| redb_err("commit", e))?;

        tracing::debug!(path = %db_path.display(), "progress store opened");
        Ok(Self { db: Arc::new(db) })
    }
}

impl ProgressStore for DurableProgressStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(PROGRESS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let result = table.get(key).map_err(|e| redb_err("get", e))?;
        Ok(result.map(|guard| guard.value().to_string()))
    }

    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            let mut table = txn
                .open_table(PROGRESS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            table
                .insert(key, value)
                .map_err(|e| redb_err("insert", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            let mut table = txn
                .open_table(PROGRESS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            table.remove(key).map_err(|e| redb_err("remove", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(())
    }

    /// One transaction for the whole batch. Dropping it uncommitted on error
    /// aborts every insert.
    fn put_many(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            let mut table = txn
                .open_table(PROGRESS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            for (key, value) in pairs {
                table
                    .insert(key.as_str(), value.as_str())
                    .map_err(|e| redb_err("insert", e))?;
            }
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        tracing::debug!(count = pairs.len(), "batch committed");
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(PROGRESS_TABLE)
            .map_err(|e| redb_err("open_table", e))?;
        let mut entries = Vec::new();
        for item in table.iter().map_err(|e| redb_err("iter", e))? {
            let (key, value) = item.map_err(|e| redb_err("iter", e))?;
            entries.push((key.value().to_string(), value.value().to_string()));
        }
        // redb iterates in key order already.
        Ok(entries)
    }

    fn clear(&self) -> StoreResult<usize> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        let removed = {
            let mut table = txn
                .open_table(PROGRESS_TABLE)
                .map_err(|e| redb_err("open_table", e))?;
            let mut keys = Vec::new();
            for item in table.iter().map_err(|e| redb_err("iter", e))? {
                let (key, _) = item.map_err(|e| redb_err("iter", e))?;
                let key = key.value().to_string();
                if is_progress_key(&key) {
                    keys.push(key);
                }
            }
            for key in &keys {
                table
                    .remove(key.as_str())
                    .map_err(|e| redb_err("remove", e))?;
            }
            keys.len()
        };
        txn.commit().map_err(|e| redb_err("commit", e))?;
        tracing::info!(removed, "progress store cleared");
        Ok(removed)
    }
}

impl std::fmt::Debug for DurableProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableProgressStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::TaskStatus;
    use tempfile::TempDir;

    #[test]
    fn put_get_clear() {
        let dir = TempDir::new().unwrap();
        let store = DurableProgressStore::open(dir.path()).unwrap();

        store.put_raw("action-a", "completed").unwrap();
        assert_eq!(store.get_raw("action-a").unwrap().as_deref(), Some("completed"));

        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.get_raw("action-a").unwrap(), None);
    }

    #[test]
    fn fresh_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DurableProgressStore::open(dir.path()).unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert_eq!(store.status("anything").unwrap(), TaskStatus::NotStarted);
    }

    #[test]
    fn overwrite_value() {
        let dir = TempDir::new().unwrap();
        let store = DurableProgressStore::open(dir.path()).unwrap();

        store.set_status("a", TaskStatus::InProgress).unwrap();
        store.set_status("a", TaskStatus::Blocked).unwrap();
        assert_eq!(store.status("a").unwrap(), TaskStatus::Blocked);
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn persistence_across_reopens() {
        let dir = TempDir::new().unwrap();

        {
            let store = DurableProgressStore::open(dir.path()).unwrap();
            store.add_struggle_minutes("a", 25).unwrap();
        }

        let store = DurableProgressStore::open(dir.path()).unwrap();
        assert_eq!(store.struggle_minutes("a").unwrap(), 25);
    }

    #[test]
    fn batch_write_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = DurableProgressStore::open(dir.path()).unwrap();
            store.put_raw("action-a", "blocked").unwrap();
            store
                .put_many(&[
                    ("action-a".to_string(), "completed".to_string()),
                    ("struggle-a".to_string(), "40".to_string()),
                ])
                .unwrap();
            store.remove_raw("missing").unwrap();
        }

        let store = DurableProgressStore::open(dir.path()).unwrap();
        assert_eq!(store.status("a").unwrap(), TaskStatus::Completed);
        assert_eq!(store.struggle_minutes("a").unwrap(), 40);
        store.remove_raw("struggle-a").unwrap();
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn entries_in_key_order() {
        let dir = TempDir::new().unwrap();
        let store = DurableProgressStore::open(dir.path()).unwrap();
        store.put_raw("struggle-b", "5").unwrap();
        store.put_raw("action-b", "completed").unwrap();
        let keys: Vec<_> = store.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["action-b", "struggle-b"]);
    }
}
