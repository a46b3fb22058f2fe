//! Journal domain model.
//!
//! # Responsibility
//! - Define the records persisted in the cache snapshot.
//! - Own the fixed category set and cache schema versioning.
//!
//! # Invariants
//! - `Cache.entries` and `Cache.memos` are always present after normalization.
//! - Unknown record fields survive a load/save cycle untouched.

pub mod cache;
pub mod category;
pub mod record;
