//! Export, import and reset of the progress key space.
//!
//! A backup is a flat JSON object mapping `action-<id>` / `struggle-<id>` keys
//! to their raw string values, sorted by key. Import validates the whole
//! document before touching the store, then merges.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::BackupError;
use crate::progress::{ProgressStore, is_progress_key};

/// Result type for backup operations.
pub type BackupResult<T> = std::result::Result<T, BackupError>;

/// Snapshot of every progress key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backup {
    pub entries: BTreeMap<String, String>,
}

/// Outcome of [`import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Keys written to the store.
    pub restored: usize,
    /// Keys outside the progress namespace, ignored.
    pub skipped: usize,
}

impl Backup {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> String {
        // A string-to-string map always serializes.
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a backup document. Any value that is not a string rejects the whole file.
    pub fn from_json(text: &str) -> BackupResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| BackupError::Malformed {
                message: e.to_string(),
            })?;
        let serde_json::Value::Object(map) = value else {
            return Err(BackupError::Malformed {
                message: "top-level value must be an object".into(),
            });
        };
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            match value {
                serde_json::Value::String(s) => {
                    entries.insert(key, s);
                }
                other => {
                    return Err(BackupError::Malformed {
                        message: format!("value for \"{key}\" must be a string, found {other}"),
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn write_file(&self, path: &Path) -> BackupResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BackupError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, self.to_json_pretty()).map_err(|e| BackupError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), entries = self.len(), "backup written");
        Ok(())
    }

    pub fn read_file(path: &Path) -> BackupResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BackupError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&text)
    }
}

/// Snapshot every progress key in the store.
pub fn export<S>(store: &S) -> BackupResult<Backup>
where
    S: ProgressStore + ?Sized,
{
    let entries = store
        .entries()?
        .into_iter()
        .filter(|(key, _)| is_progress_key(key))
        .collect();
    Ok(Backup { entries })
}

/// Merge a backup into the store, overwriting keys it names.
///
/// The restorable keys are written as one batch: a failed import leaves the
/// store as it was.
pub fn import<S>(store: &S, backup: &Backup) -> BackupResult<ImportReport>
where
    S: ProgressStore + ?Sized,
{
    let mut batch = Vec::with_capacity(backup.entries.len());
    let mut skipped = 0;
    for (key, value) in &backup.entries {
        if is_progress_key(key) {
            batch.push((key.clone(), value.clone()));
        } else {
            tracing::debug!(key = %key, "skipping key outside the progress namespace");
            skipped += 1;
        }
    }
    store.put_many(&batch)?;
    let report = ImportReport {
        restored: batch.len(),
        skipped,
    };
    tracing::info!(restored = report.restored, skipped = report.skipped, "backup imported");
    Ok(report)
}

/// Remove all progress. Returns how many keys were removed.
pub fn reset<S>(store: &S) -> BackupResult<usize>
where
    S: ProgressStore + ?Sized,
{
    Ok(store.clear()?)
}

/// `trailmap-backup-YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("trailmap-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Default backup path for `date` inside `dir`.
pub fn default_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(default_file_name(date))
}
