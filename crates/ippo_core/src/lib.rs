//! Core logic for the Ippo journal: local store, sync-queue bookkeeping and
//! category-balance recommendations.
//! This crate is the single source of truth for data invariants.

pub mod clock;
pub mod codec;
pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock, DAY_MS};
pub use codec::{decode, encode, read_json, write_json, Decoded};
pub use config::{load_config, ConfigError, CoreConfig};
pub use kv::{KeyValueStore, MemoryStore, SqliteKvStore, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cache::{Cache, CURRENT_SCHEMA_VERSION};
pub use model::category::Category;
pub use model::record::{Entry, Memo};
pub use repo::cache_repo::CacheRepository;
pub use repo::settings_repo::SettingsRepository;
pub use repo::sync_queue::{QueueEntry, SyncQueue};
pub use service::entry_service::{local_date_time, EntryMemoService, NewEntryRequest};
pub use service::recommend::{
    summarize, CategorySummary, Proposal, ProposalChoice, ProposalMeta, ProposalSet,
    RecommendationEngine, DEFAULT_WINDOW_DAYS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
