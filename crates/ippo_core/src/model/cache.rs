//! Cache snapshot and schema normalization.
//!
//! # Responsibility
//! - Define the full `{schemaVersion, entries, memos}` unit of persistence.
//! - Normalize untrusted JSON into a valid snapshot.
//! - Upgrade older snapshots one schema version at a time.
//!
//! # Invariants
//! - Load normalization rejects a payload whose `entries` or `memos` is not a
//!   sequence; save normalization replaces such a field with an empty one.
//! - A missing or non-integer `schemaVersion` reads as `1`.
//! - Individual records are never validated, dropped or rewritten.
//! - Snapshots newer than `CURRENT_SCHEMA_VERSION` are never downgraded.

use crate::model::record::{Entry, Memo};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version written by this crate.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Version assumed when a payload does not declare one.
pub const DEFAULT_SCHEMA_VERSION: u32 = 1;

/// Full local snapshot of entries and memos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub entries: Vec<Entry>,
    pub memos: Vec<Memo>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            schema_version: DEFAULT_SCHEMA_VERSION,
            entries: Vec::new(),
            memos: Vec::new(),
        }
    }
}

impl Cache {
    /// Canonical empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes a persisted payload for reading.
    ///
    /// Returns `None` when the payload is not an object or when either
    /// collection is absent or not a sequence.
    pub fn from_persisted(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        let entries = match fields.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => return None,
        };
        let memos = match fields.remove("memos") {
            Some(Value::Array(items)) => items,
            _ => return None,
        };

        Some(Self::assemble(&fields, entries, memos))
    }

    /// Normalizes an externally supplied payload for writing.
    ///
    /// Missing or mistyped collections become empty sequences instead of
    /// invalidating the whole payload.
    pub fn from_unchecked(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::empty();
        };
        let entries = match fields.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let memos = match fields.remove("memos") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        Self::assemble(&fields, entries, memos)
    }

    /// Re-validates an in-memory snapshot before it is written.
    pub fn normalized(&self) -> Self {
        upgrade(self.clone())
    }

    fn assemble(fields: &Map<String, Value>, entries: Vec<Value>, memos: Vec<Value>) -> Self {
        let schema_version = fields
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .and_then(|version| u32::try_from(version).ok())
            .unwrap_or(DEFAULT_SCHEMA_VERSION);

        upgrade(Self {
            schema_version,
            entries: entries.into_iter().map(Entry::from_value).collect(),
            memos: memos.into_iter().map(Memo::from_value).collect(),
        })
    }
}

#[derive(Clone, Copy)]
struct SchemaUpgrade {
    from: u32,
    apply: fn(&mut Cache),
}

const UPGRADES: &[SchemaUpgrade] = &[SchemaUpgrade {
    from: 0,
    apply: upgrade_unversioned,
}];

/// Version 0 predates explicit versioning; the record layout is identical.
fn upgrade_unversioned(_cache: &mut Cache) {}

/// Applies every upgrade step between the snapshot version and the current one.
pub fn upgrade(mut cache: Cache) -> Cache {
    if cache.schema_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "event=cache_upgrade module=model status=skipped version={} latest_supported={}",
            cache.schema_version, CURRENT_SCHEMA_VERSION
        );
        return cache;
    }

    for step in UPGRADES {
        if step.from == cache.schema_version {
            (step.apply)(&mut cache);
            cache.schema_version = step.from + 1;
        }
    }
    cache
}
