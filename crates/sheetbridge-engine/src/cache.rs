//! Generic cache with TTL (Time-To-Live) support.
//!
//! Expiry is measured against an injected [`Clock`], so entries can be aged
//! deterministically in tests. The cache is internally synchronized and can
//! be shared behind an `Arc`.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use sheetbridge_core::{SharedClock, SystemClock};
use tracing::{debug, trace};

/// Cache entry containing a value and its lifetime.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            // TTLs too large to represent never expire.
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Key/value cache whose entries expire after a TTL.
pub struct TtlCache<K, V> {
    default_ttl: Duration,
    clock: SharedClock,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .field("len", &self.lock().len())
            .finish()
    }
}

impl<K, V> TtlCache<K, V> {
    /// Creates a cache driven by the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, SystemClock::shared())
    }

    /// Creates a cache driven by the given clock.
    pub fn with_clock(default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            default_ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted = evicted, "Evicted expired cache entries");
        }
        evicted
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Returns a copy of the value for `key` if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Returns true if `key` holds a live entry.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Inserts or replaces an entry with the default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Inserts or replaces an entry with a custom TTL.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.lock().insert(key, entry);
        trace!(ttl_secs = ttl.num_seconds(), "Inserted cache entry");
    }

    /// Removes an entry. Returns true if one was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Returns the cached value for `key`, or computes it and stores it for `ttl`.
    ///
    /// Errors from `compute` are returned as-is and never cached. The lock is
    /// not held while `compute` runs, so concurrent misses on the same key
    /// may each compute; the last one to finish wins.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            trace!("Cache hit");
            return Ok(value);
        }

        let value = compute().await?;
        self.insert_with_ttl(key, value.clone(), ttl);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sheetbridge_core::ManualClock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn cache(clock: &Arc<ManualClock>, ttl_secs: i64) -> TtlCache<String, u32> {
        TtlCache::with_clock(Duration::seconds(ttl_secs), clock.clone())
    }

    #[test]
    fn cache_insert_and_get() {
        let clock = clock();
        let cache = cache(&clock, 60);

        cache.insert("a".into(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert!(cache.contains(&"a".to_string()));
        assert_eq!(cache.get(&"missing".to_string()), None);
    }

    #[test]
    fn cache_expiration() {
        let clock = clock();
        let cache = cache(&clock, 60);

        cache.insert("a".into(), 1);
        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        // Expiry is inclusive.
        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_evict_expired() {
        let clock = clock();
        let cache = cache(&clock, 10);

        cache.insert("short".into(), 1);
        cache.insert_with_ttl("long".into(), 2, Duration::seconds(120));

        clock.advance(Duration::seconds(30));
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"long".to_string()), Some(2));
        assert!(!cache.contains(&"short".to_string()));
    }

    #[test]
    fn cache_invalidate() {
        let clock = clock();
        let cache = cache(&clock, 60);

        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        assert!(cache.invalidate(&"a".to_string()));
        assert!(!cache.invalidate(&"a".to_string()));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"b".to_string()));
    }

    #[test]
    fn huge_ttl_never_expires() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::with_clock(Duration::MAX, clock.clone());

        cache.insert("a".into(), 1);
        clock.advance(Duration::days(365 * 100));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[tokio::test]
    async fn get_or_compute_caches_until_expiry() {
        let clock = clock();
        let cache = cache(&clock, 60);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(7)
        };

        assert_eq!(cache.get_or_compute("k".into(), Duration::seconds(60), compute).await, Ok(7));
        assert_eq!(cache.get_or_compute("k".into(), Duration::seconds(60), compute).await, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(61));
        assert_eq!(cache.get_or_compute("k".into(), Duration::seconds(60), compute).await, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn get_or_compute_does_not_cache_errors() {
        let clock = clock();
        let cache = cache(&clock, 60);

        let result = cache
            .get_or_compute("k".into(), Duration::seconds(60), || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(result, Err("boom"));
        assert!(cache.is_empty());

        let result = cache
            .get_or_compute("k".into(), Duration::seconds(60), || async { Ok::<_, &str>(3) })
            .await;
        assert_eq!(result, Ok(3));
    }
}
