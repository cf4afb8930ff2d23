use bytes::Bytes;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use tracing::debug;

/// Byte-budgeted LRU cache for computed samples, keyed by a stable hash of
/// `(file_id, sample_size)`. Values are `Bytes`, so a hit hands back a
/// refcounted view rather than a copy.
///
/// One lock guards the map / access-order queue / size-counter triple.
/// Critical sections are pure in-memory work; sampling itself never runs
/// under this lock.
pub struct SampleCache {
    capacity: usize,
    store: Mutex<CacheStore>,
}

struct CacheStore {
    map: HashMap<u64, Bytes>,
    /// Access order: front = least recently used, back = most recent.
    order: VecDeque<u64>,
    total_size: usize,
}

impl SampleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            store: Mutex::new(CacheStore {
                map: HashMap::new(),
                order: VecDeque::new(),
                total_size: 0,
            }),
        }
    }

    /// Key derivation: hash space is smaller than the input space, so
    /// collisions are possible and accepted as an approximation.
    pub fn make_key(file_id: &str, sample_size: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        file_id.hash(&mut hasher);
        sample_size.hash(&mut hasher);
        hasher.finish()
    }

    /// A hit promotes the key to most-recently-used.
    pub fn get(&self, key: u64) -> Option<Bytes> {
        let mut store = self.store.lock().expect("cache lock poisoned");

        if let Some(data) = store.map.get(&key) {
            let data = data.clone();
            store.order.retain(|&k| k != key);
            store.order.push_back(key);
            Some(data)
        } else {
            None
        }
    }

    /// Insert, evicting LRU entries until the new one fits. An entry that
    /// cannot fit even into an empty cache is silently dropped: serve the
    /// sample, just don't cache it.
    pub fn put(&self, key: u64, data: Bytes) {
        let mut store = self.store.lock().expect("cache lock poisoned");
        let size = data.len();

        // Re-insertion replaces wholesale, so free the old entry first.
        if let Some(old) = store.map.remove(&key) {
            store.total_size -= old.len();
            store.order.retain(|&k| k != key);
        }

        while store.total_size + size > self.capacity && !store.order.is_empty() {
            if let Some(evict_key) = store.order.pop_front() {
                if let Some(evicted) = store.map.remove(&evict_key) {
                    store.total_size -= evicted.len();
                    debug!(evict_key, size = evicted.len(), "evicted cached sample");
                }
            }
        }

        if store.total_size + size <= self.capacity {
            store.map.insert(key, data);
            store.order.push_back(key);
            store.total_size += size;
        }
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        let mut store = self.store.lock().expect("cache lock poisoned");
        store.map.clear();
        store.order.clear();
        store.total_size = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock().expect("cache lock poisoned");
        CacheStats {
            entries: store.map.len(),
            total_size: store.total_size,
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: usize,
    pub capacity: usize,
}
