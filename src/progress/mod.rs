//! Persisted per-action progress: status and accumulated struggle minutes.
//!
//! Progress lives in a flat string key space:
//!
//! - `action-<id>` → status (`not-started`, `in-progress`, `blocked`, `completed`)
//! - `struggle-<id>` → whole minutes as a decimal string
//!
//! [`ProgressStore`] is the read/write/clear contract every component is handed
//! explicitly. Two backends implement it:
//!
//! - [`MemProgressStore`]: concurrent hashmap (DashMap), lost on exit
//! - [`DurableProgressStore`]: ACID transactions on disk (redb)
//!
//! Records are created lazily on the first write. Only [`ProgressStore::clear`] and
//! the rollback of a failed [`ProgressStore::put_many`] remove them.

pub mod durable;
pub mod mem;

use std::fmt;
use std::str::FromStr;

pub use durable::DurableProgressStore;
pub use mem::MemProgressStore;

use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub const STATUS_PREFIX: &str = "action-";
pub const STRUGGLE_PREFIX: &str = "struggle-";

/// Key holding an action's status.
pub fn status_key(action_id: &str) -> String {
    format!("{STATUS_PREFIX}{action_id}")
}

/// Key holding an action's struggle minutes.
pub fn struggle_key(action_id: &str) -> String {
    format!("{STRUGGLE_PREFIX}{action_id}")
}

/// Whether `key` belongs to the progress namespace.
pub fn is_progress_key(key: &str) -> bool {
    [STATUS_PREFIX, STRUGGLE_PREFIX]
        .iter()
        .any(|prefix| key.len() > prefix.len() && key.starts_with(prefix))
}

/// Completion status of an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
        }
    }

    /// The status-toggle rotation: not-started → in-progress → completed → blocked → not-started.
    pub fn next(self) -> Self {
        match self {
            Self::NotStarted => Self::InProgress,
            Self::InProgress => Self::Completed,
            Self::Completed => Self::Blocked,
            Self::Blocked => Self::NotStarted,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status \"{other}\"")),
        }
    }
}

/// Read/write/clear contract over the progress key space.
///
/// Implementors provide raw string access; the typed accessors are built on top
/// and tolerate garbage values (an unknown status reads as not-started, unparsable
/// minutes read as zero) so a hand-edited store never takes the dashboard down.
pub trait ProgressStore {
    /// Raw value for `key`, if set.
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or replace a raw value.
    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a single key. Removing a missing key is not an error.
    fn remove_raw(&self, key: &str) -> StoreResult<()>;

    /// Write every pair or none of them.
    ///
    /// The default applies the pairs one at a time and, on the first failure,
    /// restores the previous value of every key it already wrote before
    /// returning the original error. Backends with transactions override this.
    fn put_many(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        let mut applied: Vec<(&str, Option<String>)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let previous = match self.get_raw(key) {
                Ok(previous) => previous,
                Err(e) => {
                    rollback(self, &applied);
                    return Err(e);
                }
            };
            if let Err(e) = self.put_raw(key, value) {
                rollback(self, &applied);
                return Err(e);
            }
            applied.push((key.as_str(), previous));
        }
        Ok(())
    }

    /// Every stored `(key, value)` pair, sorted by key.
    fn entries(&self) -> StoreResult<Vec<(String, String)>>;

    /// Remove every progress key. Returns how many were removed.
    fn clear(&self) -> StoreResult<usize>;

    fn status(&self, action_id: &str) -> StoreResult<TaskStatus> {
        Ok(match self.get_raw(&status_key(action_id))? {
            None => TaskStatus::NotStarted,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(action = action_id, "{e}, treating as not-started");
                TaskStatus::NotStarted
            }),
        })
    }

    fn set_status(&self, action_id: &str, status: TaskStatus) -> StoreResult<()> {
        self.put_raw(&status_key(action_id), status.as_str())
    }

    /// Advance the action one step through the status rotation and persist it.
    fn cycle_status(&self, action_id: &str) -> StoreResult<TaskStatus> {
        let next = self.status(action_id)?.next();
        self.set_status(action_id, next)?;
        tracing::debug!(action = action_id, status = %next, "status cycled");
        Ok(next)
    }

    fn struggle_minutes(&self, action_id: &str) -> StoreResult<u32> {
        Ok(match self.get_raw(&struggle_key(action_id))? {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(action = action_id, value = %raw, "unparsable struggle minutes, treating as 0");
                0
            }),
        })
    }

    /// Add `minutes` to the action's struggle total and return the new total.
    fn add_struggle_minutes(&self, action_id: &str, minutes: u32) -> StoreResult<u32> {
        let total = self.struggle_minutes(action_id)?.saturating_add(minutes);
        self.put_raw(&struggle_key(action_id), &total.to_string())?;
        Ok(total)
    }
}

/// Undo a partially applied batch, newest write first.
fn rollback<S: ProgressStore + ?Sized>(store: &S, applied: &[(&str, Option<String>)]) {
    for (key, previous) in applied.iter().rev() {
        let restored = match previous {
            Some(value) => store.put_raw(key, value),
            None => store.remove_raw(key),
        };
        if let Err(e) = restored {
            tracing::error!(key = %key, "rollback of a failed batch write left the key changed: {e}");
        }
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_raw(key)
    }

    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).put_raw(key, value)
    }

    fn remove_raw(&self, key: &str) -> StoreResult<()> {
        (**self).remove_raw(key)
    }

    fn put_many(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        (**self).put_many(pairs)
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        (**self).entries()
    }

    fn clear(&self) -> StoreResult<usize> {
        (**self).clear()
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for Box<S> {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_raw(key)
    }

    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).put_raw(key, value)
    }

    fn remove_raw(&self, key: &str) -> StoreResult<()> {
        (**self).remove_raw(key)
    }

    fn put_many(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        (**self).put_many(pairs)
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        (**self).entries()
    }

    fn clear(&self) -> StoreResult<usize> {
        (**self).clear()
    }
}
