//! Extendible hash table.
//!
//! An associative map whose directory grows dynamically: lookups cost
//! one directory probe plus a linear scan of a bounded bucket, so the
//! buffer pool gets amortized constant-time page-table access without
//! ever rehashing the whole table.
//!
//! The directory is a power-of-two array of bucket references indexed
//! by the low `global_depth` bits of a key's hash. Each bucket carries
//! a `local_depth <= global_depth`; two directory slots share a bucket
//! exactly when their low `local_depth` bits agree. A full bucket is
//! split in two (doubling the directory first when its local depth has
//! caught up with the global depth), and buckets are never merged.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use strata_common::constants::MAX_LOCAL_DEPTH;

/// Hashes a key with the process-wide deterministic hasher.
///
/// The directory index is the low `global_depth` bits of this value.
fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// A bounded run of key/value entries sharing the low `depth` bits of
/// their hashes.
struct Bucket<K, V> {
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            items: Vec::with_capacity(capacity),
        }
    }
}

/// Table state behind the latch.
///
/// The directory holds indices into the bucket arena rather than owned
/// or shared pointers; a split reuses the old bucket's arena slot for
/// the low half and appends the high half, so every arena slot stays
/// referenced by at least one directory slot.
struct Core<K, V> {
    global_depth: usize,
    bucket_size: usize,
    len: usize,
    dir: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

impl<K: Hash + Eq, V> Core<K, V> {
    fn new(bucket_size: usize) -> Self {
        Self {
            global_depth: 0,
            bucket_size,
            len: 0,
            dir: vec![0],
            buckets: vec![Bucket::new(0, bucket_size)],
        }
    }

    fn index_of<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        let mask = (1usize << self.global_depth) - 1;
        hash_of(key) as usize & mask
    }

    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = &self.buckets[self.dir[self.index_of(key)]];
        bucket
            .items
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.dir[self.index_of(key)];
        let bucket = &mut self.buckets[slot];
        match bucket.items.iter().position(|(k, _)| k.borrow() == key) {
            Some(pos) => {
                bucket.items.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, key: K, value: V) {
        // Upsert: an existing key is overwritten in place, never split.
        let slot = self.dir[self.index_of(&key)];
        if let Some(entry) = self.buckets[slot]
            .items
            .iter_mut()
            .find(|(k, _)| *k == key)
        {
            entry.1 = value;
            return;
        }

        loop {
            let slot = self.dir[self.index_of(&key)];
            let bucket = &self.buckets[slot];
            if bucket.items.len() < self.bucket_size {
                break;
            }
            // A bucket at the depth cap stops splitting and accepts
            // overflow entries, so inserts terminate even when more
            // than bucket_size keys share a full hash value.
            if bucket.depth >= MAX_LOCAL_DEPTH {
                break;
            }
            self.split(slot);
        }

        let slot = self.dir[self.index_of(&key)];
        self.buckets[slot].items.push((key, value));
        self.len += 1;
    }

    /// Splits the bucket in arena slot `slot` on its next hash bit.
    fn split(&mut self, slot: usize) {
        let local_depth = self.buckets[slot].depth;
        if local_depth == self.global_depth {
            // Double the directory; the upper half mirrors the lower.
            let len = self.dir.len();
            self.dir.extend_from_within(0..len);
            self.global_depth += 1;
        }

        let mask = 1usize << local_depth;
        let items = std::mem::take(&mut self.buckets[slot].items);
        let mut low = Vec::new();
        let mut high = Vec::new();
        for (key, value) in items {
            if hash_of(&key) as usize & mask != 0 {
                high.push((key, value));
            } else {
                low.push((key, value));
            }
        }

        self.buckets[slot].depth = local_depth + 1;
        self.buckets[slot].items = low;
        let new_slot = self.buckets.len();
        self.buckets.push(Bucket {
            depth: local_depth + 1,
            items: high,
        });

        // Repoint the directory slots whose split bit is set. After a
        // doubling, local_depth < global_depth, so both halves keep at
        // least one referent.
        for i in 0..self.dir.len() {
            if self.dir[i] == slot && i & mask != 0 {
                self.dir[i] = new_slot;
            }
        }
    }
}

/// Extendible hash table mapping `K` to `V`.
///
/// All public operations are serialized by a single internal latch;
/// the internal helpers never lock, so there is no recursive
/// acquisition. Values are returned by clone, which keeps lookups
/// latch-bounded - the intended `V` is a small copyable id.
///
/// # Example
///
/// ```rust
/// use strata_cache::extendible::ExtendibleHashTable;
///
/// let table = ExtendibleHashTable::new(2);
/// table.insert("a", 1);
/// table.insert("a", 2);
/// assert_eq!(table.find("a"), Some(2));
/// assert!(table.remove("a"));
/// assert_eq!(table.find("a"), None);
/// ```
pub struct ExtendibleHashTable<K, V> {
    latch: Mutex<Core<K, V>>,
}

impl<K: Hash + Eq, V: Clone> ExtendibleHashTable<K, V> {
    /// Creates a table with one empty bucket of the given capacity and
    /// `global_depth == 0`.
    pub fn new(bucket_size: usize) -> Self {
        Self {
            latch: Mutex::new(Core::new(bucket_size.max(1))),
        }
    }

    /// Looks up the value stored for `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.latch.lock().find(key).cloned()
    }

    /// Inserts a key/value pair, overwriting the value if the key is
    /// already present. Splits the target bucket (doubling the
    /// directory as needed) until there is room.
    pub fn insert(&self, key: K, value: V) {
        self.latch.lock().insert(key, value);
    }

    /// Removes the entry for `key`, reporting whether one existed.
    ///
    /// Buckets are never merged on removal.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.latch.lock().remove(key)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.latch.lock().len
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of hash bits used to index the directory.
    pub fn global_depth(&self) -> usize {
        self.latch.lock().global_depth
    }

    /// Returns the local depth of the bucket referenced by directory
    /// slot `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index >= 1 << global_depth()`.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let core = self.latch.lock();
        core.buckets[core.dir[dir_index]].depth
    }

    /// Returns the number of distinct buckets referenced by the
    /// directory. Monotonically non-decreasing.
    pub fn num_buckets(&self) -> usize {
        self.latch.lock().buckets.len()
    }

    /// Asserts the structural invariants; test support.
    #[cfg(test)]
    fn verify_integrity(&self) {
        use std::collections::HashSet;

        let core = self.latch.lock();
        assert_eq!(core.dir.len(), 1 << core.global_depth);

        let mut referenced = HashSet::new();
        let mut first_slot = vec![usize::MAX; core.buckets.len()];
        for (i, &slot) in core.dir.iter().enumerate() {
            assert!(slot < core.buckets.len());
            referenced.insert(slot);
            let depth = core.buckets[slot].depth;
            assert!(depth <= core.global_depth);
            let mask = (1usize << depth) - 1;
            // Slots sharing a bucket agree on the low local-depth bits.
            if first_slot[slot] == usize::MAX {
                first_slot[slot] = i;
            } else {
                assert_eq!(i & mask, first_slot[slot] & mask);
            }
        }
        // Every arena slot is reachable from the directory.
        assert_eq!(referenced.len(), core.buckets.len());

        let mut total = 0;
        for (slot, bucket) in core.buckets.iter().enumerate() {
            let mask = (1usize << bucket.depth) - 1;
            let expected = first_slot[slot] & mask;
            for (key, _) in &bucket.items {
                assert_eq!(hash_of(key) as usize & mask, expected);
            }
            if bucket.depth < MAX_LOCAL_DEPTH {
                assert!(bucket.items.len() <= core.bucket_size);
            }
            total += bucket.items.len();
        }
        assert_eq!(total, core.len);
    }
}

impl<K, V> std::fmt::Debug for ExtendibleHashTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.latch.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &core.global_depth)
            .field("num_buckets", &core.buckets.len())
            .field("len", &core.len)
            .finish()
    }
}
