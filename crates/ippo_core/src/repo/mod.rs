//! Repository layer over the key-value store.
//!
//! # Responsibility
//! - Own the persisted keys and their JSON shapes.
//! - Keep normalization and pending-change bookkeeping out of services.
//!
//! # Invariants
//! - Every cache write is followed by exactly one queue marker.
//! - Malformed persisted data degrades to documented defaults.

pub mod cache_repo;
pub mod settings_repo;
pub mod sync_queue;
