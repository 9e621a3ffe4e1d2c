//! Sharded concurrent map.
//!
//! The key space is partitioned across a fixed number of independently
//! lockable shards, hashed by key. Callers touching different shards never
//! block each other; callers touching the same key are mutually exclusive.

use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::hash_map::{Entry, RandomState};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};

/// Shard count used by [`ShardedMap::new`].
pub const DEFAULT_SHARDS: usize = 32;

/// A `HashMap` split into independently locked shards.
///
/// Every operation locks exactly one shard (a `parking_lot::RwLock`), except
/// for the whole-map operations (`len`, `clear`, `for_each`, `entries`,
/// `keys`), which visit shards one at a time without ever holding more than
/// one lock. There is no global lock and therefore no globally consistent
/// snapshot: a whole-map operation observes each shard at a slightly
/// different instant, which is the intended trade-off.
pub struct ShardedMap<K, V> {
    shards: Box<[RwLock<HashMap<K, V>>]>,
    hasher: RandomState,
}

impl<K, V> ShardedMap<K, V>
where
    K: Hash + Eq,
{
    /// Create a map with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a map with at least `count` shards, rounded up to the next
    /// power of two so shard selection is a mask instead of a modulo.
    pub fn with_shards(count: usize) -> Self {
        let count = count.next_power_of_two();
        let shards = (0..count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    /// Number of shards backing this map.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for<Q>(&self, key: &Q) -> &RwLock<HashMap<K, V>>
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        // Shard count is a power of two, so masking is a valid modulo.
        let index = (hasher.finish() as usize) & (self.shards.len() - 1);
        &self.shards[index]
    }

    /// Insert a key-value pair, returning the previous value if the key
    /// existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard_for(&key).write().insert(key, value)
    }

    /// Insert only if `key` is absent. Returns whether the insertion
    /// happened.
    ///
    /// The check and the insert happen under the shard's write lock, so this
    /// is atomic with respect to concurrent `insert`/`insert_if_absent`
    /// calls on the same key.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        match self.shard_for(&key).write().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Look up a value by key, cloning it out of the shard.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shard_for(key).read().get(key).cloned()
    }

    /// `true` if the key exists. Does not clone the value.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).read().contains_key(key)
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).write().remove(key)
    }

    /// Number of entries, summed shard by shard. Races with concurrent
    /// writers, like every whole-map operation here.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// `true` when no shard holds any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Drop all entries from every shard.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Bulk-insert from an iterator.
    pub fn extend<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }

    /// Invoke `f` once per key-value pair present at some point during the
    /// call, one shard read-locked at a time.
    ///
    /// Entries mutated concurrently may or may not be observed. The callback
    /// runs while a shard lock is held, so it must not call back into the
    /// map.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for shard in self.shards.iter() {
            let guard = shard.read();
            for (key, value) in guard.iter() {
                f(key, value);
            }
        }
    }
}

impl<K, V> ShardedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Clone all key-value pairs out of the map, shard by shard.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::new();
        self.for_each(|key, value| out.push((key.clone(), value.clone())));
        out
    }

    /// Clone all keys out of the map.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        let mut out = Vec::new();
        self.for_each(|key, _| out.push(key.clone()));
        out
    }

    /// Clone all values out of the map.
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        let mut out = Vec::new();
        self.for_each(|_, value| out.push(value.clone()));
        out
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for ShardedMap<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shard_count())
            .field("len", &self.len())
            .finish()
    }
}
