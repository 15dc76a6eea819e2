//! Cache abstraction layer for Plinth.
//!
//! This crate provides generic caching traits that decouple cache consumers
//! from the underlying storage mechanism. Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store with per-entry time-to-live
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`MemoryCache`]: In-process map shared by every bucket handle
//! - [`FileCache`]: File-based implementation with version validation
//!
//! Cache faults are never surfaced to callers. A backend that cannot read or
//! write an entry behaves like a miss, so content delivery keeps working when
//! the cache does not.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use plinth_cache::{Cache, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("placeholders");
//! bucket.set("content", b"[]", Some(Duration::from_secs(60)));
//! assert_eq!(bucket.get("content"), None); // NullCache always misses
//! ```

mod ext;
mod file;
mod memory;

use std::time::Duration;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Each bucket stores key-value pairs. Entries written with a TTL disappear
/// once it elapses; entries written without one live until overwritten or
/// evicted by the backend. Concurrent writers to the same key are resolved
/// last-write-wins.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on cache miss, expired entry, or backend failure.
    ///
    /// # Arguments
    ///
    /// * `key` - Cache key
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value in the cache.
    ///
    /// Overwrites any existing entry for the same key. A zero `ttl` stores an
    /// entry that is already expired, which is equivalent to not caching.
    ///
    /// # Arguments
    ///
    /// * `key` - Cache key
    /// * `value` - Raw bytes to cache
    /// * `ttl` - Time-to-live, `None` for no expiration
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// A `Cache` produces buckets that are logically isolated from each other.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// Calling `bucket` multiple times with the same name returns handles that
    /// share the same underlying storage.
    ///
    /// # Arguments
    ///
    /// * `name` - Bucket name (e.g., "placeholders")
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Use when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
