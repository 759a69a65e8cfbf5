//! Result cache contract and the in-memory reference store.
//!
//! A cache key is a name plus a content hash of the producing
//! parameters, so any parameter change addresses a different slot.
//! Stores only hold blobs and stamps; validity against a data watermark
//! is the caller's call.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::Serialize;

use reltab_core::hash::{hash_serde, Hash256};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub params_hash: Hash256,
}

impl CacheKey {
    /// Key a named result by a content hash of its parameters.
    pub fn new<P: Serialize>(name: &str, params: &P) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            params_hash: hash_serde(params)?,
        })
    }
}

pub trait CacheStore {
    /// Load a blob and the timestamp it was saved at.
    fn load(&self, key: &CacheKey) -> Option<(Vec<u8>, SystemTime)>;

    /// Save a blob, returning the timestamp recorded for it.
    fn save(&mut self, key: &CacheKey, blob: Vec<u8>) -> SystemTime;
}

/// Reference store: a plain map. Adequate for tests and single-process
/// use; durable stores implement the same trait.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<CacheKey, (Vec<u8>, SystemTime)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn load(&self, key: &CacheKey) -> Option<(Vec<u8>, SystemTime)> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &CacheKey, blob: Vec<u8>) -> SystemTime {
        let stamp = SystemTime::now();
        tracing::debug!(name = %key.name, bytes = blob.len(), "cache save");
        self.entries.insert(key.clone(), (blob, stamp));
        stamp
    }
}
