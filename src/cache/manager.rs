//! In-memory TTL cache for parsed zdb results
//!
//! Provides a `TtlCache` that stores shared values with expiry timestamps behind
//! a reader/writer lock. Lookups only hold the lock for the map access itself.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Separator between pool name and GUID in cache keys
const KEY_SEPARATOR: char = '|';

/// Wrapper struct for a stored value
#[derive(Debug)]
struct CacheEntry<T> {
    /// The cached value
    data: Arc<T>,
    /// When the value was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

/// Result of peeking into the cache, including metadata about freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached value
    pub data: Arc<T>,
    /// When the value was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// Builds the cache key for a pool lookup
///
/// The key is the pool name alone, or `name|guid` when a GUID is supplied.
pub fn cache_key(name: &str, guid: &str) -> String {
    if guid.is_empty() {
        name.to_string()
    } else {
        format!("{name}{KEY_SEPARATOR}{guid}")
    }
}

/// Time-bounded cache keyed by string
///
/// A TTL of zero or less disables the cache: reads always miss and writes are
/// dropped. Entries are never evicted on their own; an expired entry stays in
/// the map until a fresh value overwrites it or `clear` is called.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> TtlCache<T> {
    /// Creates an empty cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a cache with a TTL given in whole seconds
    ///
    /// Values beyond chrono's range saturate, keeping their sign.
    pub fn with_ttl_secs(secs: i64) -> Self {
        let saturated = if secs > 0 { Duration::MAX } else { Duration::MIN };
        Self::new(Duration::try_seconds(secs).unwrap_or(saturated))
    }

    /// Creates a cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(Duration::zero())
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether values are stored at all
    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    /// Returns the value for `key` if present and not yet expired
    pub fn read(&self, key: &str) -> Option<Arc<T>> {
        if !self.is_enabled() {
            return None;
        }

        let entries = self.read_entries();
        let entry = entries.get(key)?;
        (Utc::now() < entry.expires_at).then(|| Arc::clone(&entry.data))
    }

    /// Returns the entry for `key` whether or not it has expired
    pub fn peek(&self, key: &str) -> Option<CachedData<T>> {
        let entries = self.read_entries();
        let entry = entries.get(key)?;

        Some(CachedData {
            data: Arc::clone(&entry.data),
            cached_at: entry.cached_at,
            is_expired: Utc::now() >= entry.expires_at,
        })
    }

    /// Stores `data` under `key`, replacing any previous entry
    ///
    /// Does nothing when the cache is disabled.
    pub fn write(&self, key: &str, data: Arc<T>) {
        if !self.is_enabled() {
            return;
        }

        let now = Utc::now();
        let entry = CacheEntry {
            data,
            cached_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.write_entries().insert(key.to_string(), entry);
    }

    /// Drops the entry for `key`, returning whether one existed
    pub fn remove(&self, key: &str) -> bool {
        self.write_entries().remove(key).is_some()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.write_entries().clear();
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map only holds plain values, so a panic elsewhere cannot leave it half-updated.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
