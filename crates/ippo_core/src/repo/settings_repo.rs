//! Opaque sync settings passthrough.
//!
//! Settings are owned by the external syncer; this crate only moves them
//! between the store and callers and never enqueues a change for them.

use crate::codec::{read_json, write_json};
use crate::kv::{KeyValueStore, StoreResult, SETTINGS_KEY};
use serde_json::Value;

pub struct SettingsRepository<'s, S: KeyValueStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: KeyValueStore + ?Sized> SettingsRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Returns stored settings, or `None` when absent or malformed.
    pub fn load(&self) -> Option<Value> {
        read_json(self.store, SETTINGS_KEY).ok()
    }

    pub fn save(&self, settings: &Value) -> StoreResult<()> {
        write_json(self.store, SETTINGS_KEY, settings)
    }
}
