//! Entry and memo records.
//!
//! # Responsibility
//! - Carry persisted records through load/save without reshaping them.
//! - Offer typed read access to the fields aggregation relies on.
//!
//! # Invariants
//! - A record is kept exactly as stored: absent fields stay absent, mistyped
//!   fields keep their type, non-object items survive.
//! - Typed accessors return `None` instead of failing on unexpected shapes.
//! - `category` is never rewritten; only aggregation folds it into `Other`.

use crate::model::category::Category;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names making up the core entry shape.
pub const ENTRY_CORE_FIELDS: [&str; 5] = ["id", "date", "time", "text", "category"];

/// Timestamped, categorized journal note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Value);

impl Entry {
    /// Builds a fresh entry with all core fields set.
    pub fn new(
        id: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert("date".to_string(), Value::String(date.into()));
        fields.insert("time".to_string(), Value::String(time.into()));
        fields.insert("text".to_string(), Value::String(text.into()));
        fields.insert("category".to_string(), Value::String(category.into()));
        Self(Value::Object(fields))
    }

    /// Wraps a persisted item as-is.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Adds extension fields, skipping names that belong to the core shape.
    ///
    /// Returns the keys that were skipped.
    pub fn merge_extra(&mut self, extra: Map<String, Value>) -> Vec<String> {
        let mut skipped = Vec::new();
        let Value::Object(fields) = &mut self.0 else {
            return extra.into_iter().map(|(key, _)| key).collect();
        };
        for (key, value) in extra {
            if ENTRY_CORE_FIELDS.contains(&key.as_str()) {
                skipped.push(key);
                continue;
            }
            fields.insert(key, value);
        }
        skipped
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }

    pub fn date(&self) -> Option<&str> {
        str_field(&self.0, "date")
    }

    pub fn time(&self) -> Option<&str> {
        str_field(&self.0, "time")
    }

    pub fn text(&self) -> Option<&str> {
        str_field(&self.0, "text")
    }

    /// Stored category, verbatim.
    pub fn category(&self) -> Option<&str> {
        str_field(&self.0, "category")
    }

    /// Category used when counting; unknown or missing values are `Other`.
    pub fn aggregation_category(&self) -> Category {
        Category::for_aggregation(self.category().unwrap_or(""))
    }

    /// Raw access to any field, core or extension.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Extension field only; core field names always yield `None`.
    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        if ENTRY_CORE_FIELDS.contains(&key) {
            return None;
        }
        self.field(key)
    }
}

/// Lightweight to-do note with a completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memo(Value);

impl Memo {
    /// Builds a fresh, not-done memo.
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert("text".to_string(), Value::String(text.into()));
        fields.insert("done".to_string(), Value::Bool(false));
        fields.insert("createdAt".to_string(), Value::from(created_at));
        Self(Value::Object(fields))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }

    pub fn text(&self) -> Option<&str> {
        str_field(&self.0, "text")
    }

    /// `true` only when `done` is stored as boolean `true`.
    pub fn done(&self) -> bool {
        self.0.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Creation time in Unix epoch milliseconds.
    pub fn created_at(&self) -> Option<i64> {
        self.0.get("createdAt").and_then(Value::as_i64)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

fn str_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::{Entry, Memo};
    use crate::model::category::Category;
    use serde_json::{json, Map};

    #[test]
    fn entry_roundtrips_extension_fields_verbatim() {
        let value = json!({
            "id": "e1",
            "date": "2026-10-01",
            "time": "08:30",
            "text": "walk",
            "category": "Health",
            "source": "future",
            "mood": 3
        });

        let entry: Entry = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(entry.category(), Some("Health"));
        assert_eq!(entry.extra_field("source"), Some(&json!("future")));
        assert_eq!(serde_json::to_value(&entry).unwrap(), value);
    }

    #[test]
    fn mistyped_and_missing_fields_are_kept_as_stored() {
        let value = json!({"id": 1_700_000_000_000_i64, "text": null, "category": 7});
        let entry: Entry = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(entry.id(), None);
        assert_eq!(entry.text(), None);
        assert_eq!(entry.time(), None);
        assert_eq!(entry.aggregation_category(), Category::Other);
        assert_eq!(serde_json::to_value(&entry).unwrap(), value);
    }

    #[test]
    fn non_object_items_survive() {
        let entry: Entry = serde_json::from_value(json!("legacy line")).unwrap();
        assert_eq!(entry.date(), None);
        assert_eq!(entry.as_value(), &json!("legacy line"));
    }

    #[test]
    fn merge_extra_skips_core_names() {
        let mut entry = Entry::new("e1", "2026-10-01", "08:30", "x", "Work");
        let mut extra = Map::new();
        extra.insert("id".to_string(), json!("other"));
        extra.insert("source".to_string(), json!("future"));

        let skipped = entry.merge_extra(extra);
        assert_eq!(skipped, vec!["id".to_string()]);
        assert_eq!(entry.id(), Some("e1"));
        assert_eq!(entry.field("source"), Some(&json!("future")));
    }

    #[test]
    fn memo_uses_camel_case_created_at() {
        let memo = Memo::new("m1", "buy milk", 1_700_000_000_000);
        let json = serde_json::to_value(&memo).unwrap();
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["done"], false);
        assert_eq!(memo.created_at(), Some(1_700_000_000_000));
    }

    #[test]
    fn memo_with_null_done_reads_as_not_done_but_stays_null() {
        let memo: Memo = serde_json::from_value(json!({"id": "m", "done": null})).unwrap();
        assert!(!memo.done());
        assert_eq!(memo.field("done"), Some(&json!(null)));
        assert_eq!(memo.created_at(), None);
    }
}
