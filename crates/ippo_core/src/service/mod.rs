//! Core use-case services.
//!
//! # Responsibility
//! - Create records and route every mutation through `CacheRepository`.
//! - Derive action proposals from recent history.
//!
//! # See also
//! - `repo::cache_repo` for persistence and pending-change semantics.

pub mod entry_service;
pub mod recommend;
