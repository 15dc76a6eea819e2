//! In-process cache implementation.
//!
//! [`MemoryCache`] keeps every bucket in one shared map guarded by an
//! `RwLock`. Expired entries are dropped when they are read, and writes sweep
//! the whole map once it grows past a high-water mark.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::{Cache, CacheBucket};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Entry count at which a write first sweeps expired entries.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Default)]
struct Entries {
    map: HashMap<(String, String), Entry>,
    /// Size at which the next write sweeps; floored at [`SWEEP_THRESHOLD`].
    sweep_at: usize,
}

impl Entries {
    fn insert(&mut self, key: (String, String), entry: Entry) {
        if self.map.len() >= self.sweep_at.max(SWEEP_THRESHOLD) {
            let now = Instant::now();
            self.map.retain(|_, e| !e.is_expired(now));
            // Next sweep once the live set has doubled
            self.sweep_at = self.map.len().saturating_mul(2);
        }
        self.map.insert(key, entry);
    }
}

type SharedEntries = Arc<RwLock<Entries>>;

/// In-memory [`Cache`] shared across requests.
///
/// Cloning the cache yields another handle on the same storage.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: SharedEntries,
}

impl MemoryCache {
    /// Create an empty memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            name: name.to_owned(),
            entries: Arc::clone(&self.entries),
        })
    }
}

/// A single bucket view over the shared map.
struct MemoryCacheBucket {
    name: String,
    entries: SharedEntries,
}

impl MemoryCacheBucket {
    fn entry_key(&self, key: &str) -> (String, String) {
        (self.name.clone(), key.to_owned())
    }
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry_key = self.entry_key(key);
        let now = Instant::now();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.map.get(&entry_key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // Expired: evict unless a concurrent writer already replaced it
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.map.get(&entry_key).is_some_and(|e| e.is_expired(now)) {
            entries.map.remove(&entry_key);
        }
        None
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) {
        // A TTL beyond what `Instant` can represent never expires
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                self.entry_key(key),
                Entry {
                    value: value.to_vec(),
                    expires_at,
                },
            );
    }
}
