//! Cache repository.
//!
//! # Responsibility
//! - Read the full snapshot, normalized, from `CACHE_KEY`.
//! - Write the full snapshot and mark a pending change in the same call.
//!
//! # Invariants
//! - `load` never fails; absent or invalid state yields `Cache::empty()`.
//! - `CACHE_KEY` and the new marker are written as one unit: either both land
//!   or neither does.
//! - Writes replace the whole snapshot; there are no partial updates.

use crate::clock::{Clock, SYSTEM_CLOCK};
use crate::codec::{encode, read_json};
use crate::kv::{KeyValueStore, StoreResult, CACHE_KEY, QUEUE_KEY};
use crate::model::cache::Cache;
use crate::repo::sync_queue::SyncQueue;
use log::{debug, info, warn};
use serde_json::Value;

/// Owner of the persisted `{schemaVersion, entries, memos}` snapshot.
pub struct CacheRepository<'s, S: KeyValueStore + ?Sized> {
    store: &'s S,
    queue: SyncQueue<'s, S>,
}

impl<'s, S: KeyValueStore + ?Sized> CacheRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_clock(store, &SYSTEM_CLOCK)
    }

    /// Uses `clock` to stamp queue markers.
    pub fn with_clock(store: &'s S, clock: &'s dyn Clock) -> Self {
        Self {
            store,
            queue: SyncQueue::with_clock(store, clock),
        }
    }

    /// Queue that records this repository's writes.
    pub fn queue(&self) -> &SyncQueue<'s, S> {
        &self.queue
    }

    /// Reads the snapshot, substituting the empty cache for invalid state.
    pub fn load(&self) -> Cache {
        let Some(value) = read_json::<S, Value>(self.store, CACHE_KEY).ok() else {
            debug!("event=cache_load module=repo status=fallback reason=absent_or_malformed");
            return Cache::empty();
        };

        match Cache::from_persisted(value) {
            Some(cache) => {
                debug!(
                    "event=cache_load module=repo status=ok entries={} memos={}",
                    cache.entries.len(),
                    cache.memos.len()
                );
                cache
            }
            None => {
                warn!("event=cache_load module=repo status=fallback reason=invalid_shape");
                Cache::empty()
            }
        }
    }

    /// Normalizes and writes `cache`, then enqueues one pending marker.
    pub fn save(&self, cache: &Cache) -> StoreResult<()> {
        self.write(&cache.normalized())
    }

    /// Accepts a raw, possibly partial snapshot (e.g. a syncer write-back).
    pub fn save_value(&self, value: Value) -> StoreResult<()> {
        self.write(&Cache::from_unchecked(value))
    }

    fn write(&self, normalized: &Cache) -> StoreResult<()> {
        let cache_json = encode(normalized)?;
        let (marker, queue_json) = self.queue.next_queue()?;
        self.store.set_many(&[
            (CACHE_KEY, cache_json.as_str()),
            (QUEUE_KEY, queue_json.as_str()),
        ])?;
        info!(
            "event=cache_save module=repo status=ok entries={} memos={} marker_ts={}",
            normalized.entries.len(),
            normalized.memos.len(),
            marker.ts
        );
        Ok(())
    }
}
