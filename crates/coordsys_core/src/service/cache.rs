//! Bounded least-recently-used cache keyed by species.
//!
//! Capacities are tiny (a handful of species per session), so recency is
//! tracked with a `VecDeque` scan rather than a linked list.

use log::debug;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Fixed-capacity LRU map.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: NonZeroUsize,
    entries: HashMap<K, V>,
    /// Front is least recently used.
    recency: VecDeque<K>,
}

impl<K: Eq + Hash + Clone + Debug, V> LruCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.get()),
            recency: VecDeque::with_capacity(capacity.get()),
        }
    }

    /// Returns the entry without changing recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns the entry for `key`, loading it on a miss.
    ///
    /// The least recently used entry is evicted only after `load` succeeds
    /// and the cache is full. A failed load leaves the cache untouched.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        if self.entries.contains_key(&key) {
            self.touch(&key);
            return Ok(&self.entries[&key]);
        }

        let loaded = load()?;
        if self.entries.len() >= self.capacity.get() {
            self.evict_lru();
        }
        self.recency.push_back(key.clone());
        Ok(self.entries.entry(key).or_insert(loaded))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.recency.retain(|candidate| candidate != key);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    fn evict_lru(&mut self) {
        if let Some(evicted) = self.recency.pop_front() {
            self.entries.remove(&evicted);
            debug!("event=cache_evict module=service key={evicted:?}");
        }
    }

    fn touch(&mut self, key: &K) {
        if let Some(position) = self.recency.iter().position(|candidate| candidate == key) {
            if let Some(existing) = self.recency.remove(position) {
                self.recency.push_back(existing);
            }
        }
    }
}
