//! Persistent key to string storage.
//!
//! # Responsibility
//! - Define the minimal `get`/`set`/`remove` contract every backend honors.
//! - Keep callers unaware of where bytes actually live.
//!
//! # Invariants
//! - A single-key `set` is atomic: readers see the old or the new value.
//! - `set_many` writes all pairs or, on failure, leaves the earlier values.
//! - `remove` of an absent key is not an error.

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteKvStore;

/// Key holding the `{schemaVersion, entries, memos}` snapshot.
pub const CACHE_KEY: &str = "ippoDataCache_v1";
/// Key holding the pending-change marker list.
pub const QUEUE_KEY: &str = "ippoSyncQueue_v1";
/// Key holding opaque sync settings.
pub const SETTINGS_KEY: &str = "ippoOneDriveSettings_v2";
/// Legacy entry list written by older dashboard pages.
pub const LEGACY_ENTRIES_KEY: &str = "ippoLogEntries_v2";
/// Next-memo scratch value owned by the dashboard page.
pub const NEXT_MEMO_KEY: &str = "ippoNextMemo_v1";
/// Marker set by the syncer once legacy data was migrated.
pub const MIGRATION_DONE_KEY: &str = "ippoMigrationDone_v1";
/// Last sync status written by the syncer.
pub const SYNC_STATUS_KEY: &str = "ippoSyncStatus_v1";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by a storage backend or by value encoding.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// The backing file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Encode(serde_json::Error),
    /// Test doubles and wrapping stores report their own failures here.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "kv store version {db_version} is newer than this build ({latest_supported})"
            ),
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::Backend(message) => write!(f, "store backend failure: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Backend(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Abstract persistent key to string mapping.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Writes several keys as one unit.
    ///
    /// The default writes in order and, when one write fails, restores the
    /// keys already written to their previous values before returning the
    /// error. Backends with native transactions should override it.
    fn set_many(&self, pairs: &[(&str, &str)]) -> StoreResult<()> {
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let before = match self.get(key) {
                Ok(before) => before,
                Err(err) => {
                    restore(self, previous);
                    return Err(err);
                }
            };
            if let Err(err) = self.set(key, value) {
                restore(self, previous);
                return Err(err);
            }
            previous.push((*key, before));
        }
        Ok(())
    }
}

fn restore<S: KeyValueStore + ?Sized>(store: &S, previous: Vec<(&str, Option<String>)>) {
    for (key, before) in previous.into_iter().rev() {
        let restored = match before {
            Some(value) => store.set(key, &value),
            None => store.remove(key),
        };
        if let Err(err) = restored {
            warn!("event=kv_set_many module=kv status=error key={key} rollback_failed={err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryStore, StoreError, StoreResult};

    /// Delegates to a memory store but refuses writes to one key.
    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if key == self.refused {
                return Err(StoreError::Backend(format!("write to {key} refused")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn default_set_many_restores_earlier_keys_on_failure() {
        let store = RefusingStore {
            inner: MemoryStore::new(),
            refused: "c",
        };
        store.set("a", "old").unwrap();

        let err = store
            .set_many(&[("a", "new"), ("b", "fresh"), ("c", "x")])
            .unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.get("a").unwrap().as_deref(), Some("old"));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.get("c").unwrap(), None);
    }
}
