//! JSON encode/decode with explicit fallback semantics.
//!
//! # Responsibility
//! - Turn persisted strings into typed values without ever failing the caller.
//! - Make the degrade-to-default policy visible in the type system.
//!
//! # Invariants
//! - Malformed or absent input yields `Decoded::UseFallback`, never a panic.
//! - Backend read errors are treated like an absent key.

use crate::kv::{KeyValueStore, StoreResult};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Outcome of decoding persisted data.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Input parsed into the requested shape.
    Ok(T),
    /// Input was absent or malformed; the caller should use its default.
    UseFallback,
}

impl<T> Decoded<T> {
    /// Resolves to the decoded value or the provided fallback.
    pub fn or(self, fallback: T) -> T {
        match self {
            Self::Ok(value) => value,
            Self::UseFallback => fallback,
        }
    }

    pub fn or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Self::Ok(value) => value,
            Self::UseFallback => fallback(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::UseFallback)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::UseFallback => None,
        }
    }
}

/// Decodes raw JSON text into `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Decoded<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Decoded::Ok(value),
        Err(_) => Decoded::UseFallback,
    }
}

/// Encodes a value as compact JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Reads and decodes one key.
///
/// Absent keys, backend errors and malformed JSON all map to `UseFallback`.
pub fn read_json<S, T>(store: &S, key: &str) -> Decoded<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key) {
        Ok(Some(raw)) => {
            let decoded = decode(&raw);
            if decoded.is_fallback() {
                warn!("event=json_decode module=codec status=fallback key={key} reason=malformed");
            }
            decoded
        }
        Ok(None) => Decoded::UseFallback,
        Err(err) => {
            warn!("event=json_decode module=codec status=fallback key={key} reason=read_failed error={err}");
            Decoded::UseFallback
        }
    }
}

/// Encodes and writes one key.
pub fn write_json<S, T>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = encode(value)?;
    store.set(key, &raw)
}
