//! Lookup of previously imported items.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Duration;
use sheetbridge_core::{ItemRecord, SharedClock, SystemClock};
use sheetbridge_providers::BoxFuture;

use crate::cache::TtlCache;
use crate::error::StoreResult;

/// Read access to stored items, scoped by user.
pub trait RecordStore: Send + Sync {
    /// Fetches one item. `Ok(None)` means the item does not exist yet.
    fn get<'a>(
        &'a self,
        user_id: &'a str,
        item_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<ItemRecord>>>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
        item_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<ItemRecord>>> {
        (**self).get(user_id, item_id)
    }
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, HashMap<String, ItemRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `records` for one user. Records without an id are ignored.
    pub fn from_records(user_id: &str, records: impl IntoIterator<Item = ItemRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(user_id, record);
        }
        store
    }

    /// Inserts or replaces a record. Returns false if the record has no id.
    pub fn insert(&self, user_id: &str, record: ItemRecord) -> bool {
        let Some(item_id) = record.id() else {
            return false;
        };
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(user_id.to_string())
            .or_default()
            .insert(item_id, record);
        true
    }

    pub fn len(&self, user_id: &str) -> usize {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .map_or(0, HashMap::len)
    }
}

impl RecordStore for MemoryRecordStore {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
        item_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<ItemRecord>>> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(user_id)
                .and_then(|items| items.get(item_id))
                .cloned())
        })
    }
}

/// Wraps a record store with a TTL cache of lookup results.
///
/// Both hits and "not found" answers are cached; failed lookups are not.
#[derive(Debug)]
pub struct CachedRecordStore<S> {
    inner: S,
    cache: TtlCache<(String, String), Option<ItemRecord>>,
}

impl<S: RecordStore> CachedRecordStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, SystemClock::shared())
    }

    pub fn with_clock(inner: S, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            inner,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    /// Drops the cached answer for one item.
    pub fn invalidate(&self, user_id: &str, item_id: &str) -> bool {
        self.cache
            .invalidate(&(user_id.to_string(), item_id.to_string()))
    }

    pub fn cache(&self) -> &TtlCache<(String, String), Option<ItemRecord>> {
        &self.cache
    }
}

impl<S: RecordStore> RecordStore for CachedRecordStore<S> {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
        item_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<ItemRecord>>> {
        Box::pin(async move {
            let key = (user_id.to_string(), item_id.to_string());
            if !self.cache.contains(&key) {
                self.cache.evict_expired();
            }
            self.cache
                .get_or_compute(key, self.cache.default_ttl(), || {
                    self.inner.get(user_id, item_id)
                })
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::{TimeZone, Utc};
    use sheetbridge_core::ManualClock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryRecordStore,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl RecordStore for CountingStore {
        fn get<'a>(
            &'a self,
            user_id: &'a str,
            item_id: &'a str,
        ) -> BoxFuture<'a, StoreResult<Option<ItemRecord>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Box::pin(async { Err(StoreError::unavailable("offline")) });
            }
            self.inner.get(user_id, item_id)
        }
    }

    fn record(id: &str, name: &str) -> ItemRecord {
        ItemRecord::new().with("id", id).with("name", name)
    }

    #[tokio::test]
    async fn memory_store_is_scoped_by_user() {
        let store = MemoryRecordStore::from_records("u1", [record("1", "A"), ItemRecord::new()]);
        assert_eq!(store.len("u1"), 1);

        assert!(store.get("u1", "1").await.unwrap().is_some());
        assert!(store.get("u2", "1").await.unwrap().is_none());
        assert!(store.get("u1", "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cached_store_caches_hits_and_misses() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let inner = Arc::new(CountingStore::default());
        inner.inner.insert("u1", record("1", "A"));
        let cached =
            CachedRecordStore::with_clock(inner.clone(), Duration::seconds(30), clock.clone());

        assert!(cached.get("u1", "1").await.unwrap().is_some());
        assert!(cached.get("u1", "1").await.unwrap().is_some());
        assert!(cached.get("u1", "404").await.unwrap().is_none());
        assert!(cached.get("u1", "404").await.unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::seconds(31));
        assert!(cached.get("u1", "1").await.unwrap().is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);

        assert!(cached.invalidate("u1", "1"));
        assert!(cached.get("u1", "1").await.unwrap().is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn cached_store_sweeps_expired_entries_on_miss() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let inner = Arc::new(CountingStore::default());
        let cached =
            CachedRecordStore::with_clock(inner.clone(), Duration::seconds(30), clock.clone());

        for id in ["1", "2", "3"] {
            cached.get("u1", id).await.unwrap();
        }
        assert_eq!(cached.cache().len(), 3);

        clock.advance(Duration::seconds(31));
        cached.get("u1", "4").await.unwrap();
        assert_eq!(cached.cache().len(), 1);
    }

    #[tokio::test]
    async fn cached_store_does_not_cache_failures() {
        let inner = Arc::new(CountingStore::default());
        inner.inner.insert("u1", record("1", "A"));
        inner.failing.store(true, Ordering::SeqCst);
        let cached = CachedRecordStore::new(inner.clone(), Duration::seconds(30));

        assert!(cached.get("u1", "1").await.is_err());
        assert!(cached.cache().is_empty());

        inner.failing.store(false, Ordering::SeqCst);
        assert!(cached.get("u1", "1").await.unwrap().is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
