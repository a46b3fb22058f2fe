//! Entry and memo creation service.
//!
//! # Responsibility
//! - Build new records with generated identifiers.
//! - Append them through a full load, mutate, save cycle.
//!
//! # Invariants
//! - Every successful call performs exactly one cache save, hence one
//!   queue marker.
//! - Extension fields never override the core entry fields. This differs
//!   from the browser dashboard, where `meta` was spread last and could
//!   replace `id` or `category`; here a caller cannot forge identifiers.
//! - Concurrent writers in one process can lose updates; callers are
//!   expected to serialize mutations.

use crate::clock::{Clock, SYSTEM_CLOCK};
use crate::kv::{KeyValueStore, StoreResult};
use crate::model::category::Category;
use crate::model::record::{Entry, Memo};
use crate::repo::cache_repo::CacheRepository;
use crate::service::recommend::{ProposalChoice, ProposalSet};
use chrono::{Local, TimeZone};
use log::{debug, info, warn};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Extension field value written on entries adopted from proposals.
pub const PROPOSAL_SOURCE: &str = "future";

static FALLBACK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Request model for a new journal entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEntryRequest {
    /// ISO-8601 date, usually `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM` wall time.
    pub time: String,
    pub text: String,
    /// Empty means `Other`.
    pub category: String,
    /// Extension fields merged onto the record.
    pub meta: Map<String, Value>,
}

impl NewEntryRequest {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            text: text.into(),
            category: category.into(),
            meta: Map::new(),
        }
    }

    /// Adds one extension field.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Use-case service for appending entries and memos.
pub struct EntryMemoService<'s, S: KeyValueStore + ?Sized> {
    cache: CacheRepository<'s, S>,
    clock: &'s dyn Clock,
}

impl<'s, S: KeyValueStore + ?Sized> EntryMemoService<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_clock(store, &SYSTEM_CLOCK)
    }

    pub fn with_clock(store: &'s S, clock: &'s dyn Clock) -> Self {
        Self {
            cache: CacheRepository::with_clock(store, clock),
            clock,
        }
    }

    pub fn cache(&self) -> &CacheRepository<'s, S> {
        &self.cache
    }

    /// Pending changes not yet drained by the syncer.
    pub fn pending_count(&self) -> usize {
        self.cache.queue().pending_count()
    }

    /// Appends a new entry and returns it.
    ///
    /// # Contract
    /// - Empty `category` becomes `Other`.
    /// - `meta` keys colliding with core fields are ignored.
    pub fn add_entry(&self, request: NewEntryRequest) -> StoreResult<Entry> {
        let NewEntryRequest {
            date,
            time,
            text,
            category,
            meta,
        } = request;

        let category = if category.is_empty() {
            Category::Other.as_str().to_string()
        } else {
            category
        };
        let extra_fields = meta.len();
        let mut entry = Entry::new(generate_id(self.clock), date, time, text, category);
        for key in entry.merge_extra(meta) {
            debug!("event=entry_add module=service status=skipped_meta key={key}");
        }

        let mut cache = self.cache.load();
        cache.entries.push(entry.clone());
        self.cache.save(&cache)?;
        info!(
            "event=entry_add module=service status=ok category={} extra_fields={}",
            entry.aggregation_category(),
            extra_fields
        );
        Ok(entry)
    }

    /// Appends a new, not-done memo and returns it.
    pub fn add_memo(&self, text: impl Into<String>) -> StoreResult<Memo> {
        let memo = Memo::new(generate_id(self.clock), text, self.clock.now_ms());

        let mut cache = self.cache.load();
        cache.memos.push(memo.clone());
        self.cache.save(&cache)?;
        info!("event=memo_add module=service status=ok");
        Ok(memo)
    }

    /// Saves the chosen proposal as a regular entry stamped with local now.
    pub fn record_proposal(
        &self,
        proposals: &ProposalSet,
        choice: ProposalChoice,
        executed: bool,
        memo: &str,
    ) -> StoreResult<Entry> {
        let chosen = proposals.get(choice);
        let mut text = format!(
            "[Future proposal {choice}] {} ({} min) {}",
            chosen.title,
            chosen.minutes,
            if executed { "done" } else { "not done" }
        );
        let memo = memo.trim();
        if !memo.is_empty() {
            text.push_str(" / memo: ");
            text.push_str(memo);
        }

        let (date, time) = local_date_time(self.clock.now_ms());
        self.add_entry(
            NewEntryRequest::new(date, time, text, chosen.cat.as_str())
                .with_meta("source", PROPOSAL_SOURCE),
        )
    }
}

/// Local `YYYY-MM-DD` and `HH:MM` for an epoch-millisecond instant.
pub fn local_date_time(now_ms: i64) -> (String, String) {
    match Local.timestamp_millis_opt(now_ms).single() {
        Some(local) => (
            local.format("%Y-%m-%d").to_string(),
            local.format("%H:%M").to_string(),
        ),
        None => ("1970-01-01".to_string(), "00:00".to_string()),
    }
}

/// Random v4 UUID, or a timestamp plus pseudo-random suffix when the OS
/// random source fails. The fallback is not guaranteed unique.
pub fn generate_id(clock: &dyn Clock) -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(err) => {
            warn!("event=id_generate module=service status=fallback error={err}");
            fallback_id(clock.now_ms())
        }
    }
}

fn fallback_id(now_ms: i64) -> String {
    let sequence = FALLBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut rng = StdRng::seed_from_u64((now_ms as u64).rotate_left(17) ^ sequence);
    format!("{now_ms}{:x}", rng.gen::<u64>())
}
