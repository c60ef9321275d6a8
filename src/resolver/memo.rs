use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe in-memory memoization map.
///
/// Values are stored behind `Arc`, so every reader of a key gets the same
/// instance. Entries are never evicted. A failed computation stores nothing.
pub struct ResolutionMemo<K, V> {
    inner: RwLock<HashMap<K, Arc<V>>>,
    /// One lock per key whose computation is running
    in_flight: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash, V> Default for ResolutionMemo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> ResolutionMemo<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            in_flight: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Store `value` unless the key is already present; returns the stored entry.
    pub fn insert_shared(&self, key: K, value: Arc<V>) -> Arc<V> {
        let mut map = self.inner.write();
        map.entry(key).or_insert(value).clone()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let map = self.inner.read();
        map.get(key).cloned()
    }

    /// Return the cached value for `key`, computing it on a miss.
    ///
    /// At most one caller computes a given key at a time. Callers missing the
    /// same key wait for it and then read the stored value. After a failure
    /// the next waiter computes again. Hits and other keys never wait.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E>
    where
        K: Clone,
    {
        self.get_or_try_insert_shared_with(key, || compute().map(Arc::new))
    }

    /// Like [`get_or_try_insert_with`](Self::get_or_try_insert_with) for a
    /// value that is already shared.
    pub fn get_or_try_insert_shared_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E>
    where
        K: Clone,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let flight = self.in_flight.entry(key.clone()).or_default().clone();
        let _computing = flight.lock();
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = compute()?;
        let stored = self.insert_shared(key.clone(), value);
        self.in_flight.remove(key);
        Ok(stored)
    }
}
