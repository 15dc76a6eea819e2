//! Extension trait for [`CacheBucket`] with typed convenience methods.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for [`CacheBucket`].
///
/// Implemented as default methods on an extension trait so that
/// [`CacheBucket`] stays object-safe and implementors only handle raw bytes.
///
/// # Example
///
/// ```
/// use plinth_cache::{Cache, CacheBucketExt, NullCache};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Rendered { slot: String }
///
/// let cache = NullCache;
/// let bucket = cache.bucket("placeholders");
///
/// bucket.set_json("content", &Rendered { slot: "content".into() }, None);
/// let data: Option<Rendered> = bucket.get_json("content");
/// assert!(data.is_none());
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value from the cache.
    ///
    /// Returns `None` on cache miss, expiry, or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON in the cache.
    ///
    /// Silently does nothing if serialization fails.
    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, &bytes, ttl);
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Cache, MemoryCache};

    #[test]
    fn test_json_round_trip_through_memory_bucket() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("versions");

        bucket.set_json("scope", &(42_i64, vec!["accept-language".to_owned()]), None);
        let value: Option<(i64, Vec<String>)> = bucket.get_json("scope");

        assert_eq!(value, Some((42, vec!["accept-language".to_owned()])));
    }

    #[test]
    fn test_get_json_discards_garbage() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("versions");

        bucket.set("scope", b"not json", None);
        let value: Option<(i64, Vec<String>)> = bucket.get_json("scope");

        assert!(value.is_none());
    }
}
