//! Versioned cache keys for rendered placeholder content.
//!
//! Every `(placeholder, language, site)` scope owns a version record holding
//! a version token and the names of the request headers its content varies
//! on. Content keys embed the token and a digest of those header values, so
//! a new token orphans all content written under the old one.
//!
//! There is no explicit invalidation: entries live until their TTL runs out.

use std::collections::HashMap;
use std::time::Duration;

use plinth_cache::{Cache, CacheBucket, CacheBucketExt};
use plinth_store::{PlaceholderId, SiteId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

/// Cache bucket holding placeholder versions and content.
const BUCKET: &str = "placeholders";

/// The scope a cached placeholder rendering belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheScope<'a> {
    /// Placeholder identity.
    pub placeholder: PlaceholderId,
    /// Language code.
    pub language: &'a str,
    /// Site identity.
    pub site: SiteId,
}

/// Version token plus vary-on header names of a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheVersion {
    /// Version token (wall-clock microseconds at creation).
    pub version: u64,
    /// Lower-case request header names the content varies on.
    pub vary_on: Vec<String>,
}

/// Computes and persists placeholder cache keys on top of a [`Cache`].
pub struct CacheKeyStore {
    bucket: Box<dyn CacheBucket>,
    prefix: String,
}

impl CacheKeyStore {
    /// Create a key store writing into the `placeholders` bucket of `cache`.
    #[must_use]
    pub fn new(cache: &dyn Cache, prefix: &str) -> Self {
        Self {
            bucket: cache.bucket(BUCKET),
            prefix: prefix.to_owned(),
        }
    }

    fn version_key(&self, scope: &CacheScope<'_>) -> String {
        format!(
            "{}|render_placeholder_version|id:{}|lang:{}|site:{}:rest",
            self.prefix, scope.placeholder, scope.language, scope.site
        )
    }

    fn content_key(&self, scope: &CacheScope<'_>, version: u64, signature: &str) -> String {
        format!(
            "{}|render_placeholder|id:{}|lang:{}|site:{}|v:{version}|{signature}:rest",
            self.prefix, scope.placeholder, scope.language, scope.site
        )
    }

    /// Current version of `scope`.
    ///
    /// An absent record is created with the current time and no vary headers.
    pub fn get_version(&self, scope: &CacheScope<'_>) -> CacheVersion {
        let key = self.version_key(scope);
        if let Some((version, vary_on)) = self.bucket.get_json::<(u64, Vec<String>)>(&key) {
            return CacheVersion { version, vary_on };
        }

        let version = now_micros();
        tracing::debug!(placeholder = scope.placeholder, language = %scope.language, version, "Creating placeholder cache version");
        self.bucket.set_json(&key, &(version, Vec::<String>::new()), None);
        CacheVersion {
            version,
            vary_on: Vec::new(),
        }
    }

    /// Store the version record of `scope`. A zero `version` is replaced by
    /// the current time.
    pub fn set_version(
        &self,
        scope: &CacheScope<'_>,
        version: u64,
        vary_on: &[String],
        ttl: Option<Duration>,
    ) {
        let version = if version == 0 { now_micros() } else { version };
        self.bucket
            .set_json(&self.version_key(scope), &(version, vary_on), ttl);
    }

    /// Cached content of `scope` under `version` and vary `signature`.
    pub fn get<T: DeserializeOwned>(
        &self,
        scope: &CacheScope<'_>,
        version: u64,
        signature: &str,
    ) -> Option<T> {
        self.bucket
            .get_json(&self.content_key(scope, version, signature))
    }

    /// Store content of `scope` under `version` and vary `signature`.
    pub fn set<T: Serialize>(
        &self,
        scope: &CacheScope<'_>,
        version: u64,
        signature: &str,
        value: &T,
        ttl: Option<Duration>,
    ) {
        self.bucket
            .set_json(&self.content_key(scope, version, signature), value, ttl);
    }
}

/// Digest of the request's values for the `vary_on` headers.
///
/// Missing headers contribute `_`. `headers` must be keyed by lower-case name.
#[must_use]
pub fn vary_signature(vary_on: &[String], headers: &HashMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for name in vary_on {
        let value = headers
            .get(&name.to_ascii_lowercase())
            .map_or("_", String::as_str);
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn now_micros() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or(1)
}
