//! Pending-change marker queue.
//!
//! # Responsibility
//! - Record that unsynced local work exists, and how much.
//! - Let an external syncer drain the markers after a remote write.
//!
//! # Invariants
//! - Markers carry only a timestamp; no change payload is kept.
//! - A non-sequence persisted value counts as an empty queue.

use crate::clock::{Clock, SYSTEM_CLOCK};
use crate::codec::{encode, read_json, write_json};
use crate::kv::{KeyValueStore, StoreResult, QUEUE_KEY};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pending-change marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Unix epoch milliseconds when the change was recorded.
    pub ts: i64,
}

/// Queue of pending-change markers persisted under `QUEUE_KEY`.
pub struct SyncQueue<'s, S: KeyValueStore + ?Sized> {
    store: &'s S,
    clock: &'s dyn Clock,
}

impl<'s, S: KeyValueStore + ?Sized> SyncQueue<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_clock(store, &SYSTEM_CLOCK)
    }

    pub fn with_clock(store: &'s S, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Appends one marker stamped with the current time.
    pub fn enqueue(&self) -> StoreResult<QueueEntry> {
        let (entry, encoded) = self.next_queue()?;
        self.store.set(QUEUE_KEY, &encoded)?;
        debug!("event=queue_enqueue module=repo status=ok ts={}", entry.ts);
        Ok(entry)
    }

    /// Builds the marker and the encoded queue that would hold it, without writing.
    pub(crate) fn next_queue(&self) -> StoreResult<(QueueEntry, String)> {
        let mut markers = self.raw_markers();
        let entry = QueueEntry {
            ts: self.clock.now_ms(),
        };
        markers.push(serde_json::to_value(entry)?);
        Ok((entry, encode(&markers)?))
    }

    /// Resets the queue to an empty sequence.
    pub fn clear(&self) -> StoreResult<()> {
        write_json(self.store, QUEUE_KEY, &Vec::<QueueEntry>::new())?;
        debug!("event=queue_clear module=repo status=ok");
        Ok(())
    }

    /// Number of persisted markers.
    pub fn pending_count(&self) -> usize {
        self.raw_markers().len()
    }

    /// Markers that decode as `{ts}`, oldest first.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.raw_markers()
            .into_iter()
            .filter_map(|marker| serde_json::from_value(marker).ok())
            .collect()
    }

    fn raw_markers(&self) -> Vec<Value> {
        read_json::<S, Value>(self.store, QUEUE_KEY)
            .ok()
            .and_then(|value| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default()
    }
}
