//! Extendible hash table.
//!
//! In-memory variant of the classic dynamic hashing scheme: a directory of
//! `2^global_depth` slots indexes buckets by the low bits of the key hash,
//! and a full bucket splits into two (doubling the directory when the
//! bucket already uses every directory bit) instead of the whole table
//! rehashing at once.

use {
    ahash::RandomState,
    parking_lot::RwLock,
    std::{
        hash::{BuildHasher, Hash},
        mem,
        sync::Arc,
    },
};

/// A bucket holding up to `bucket_size` key/value pairs whose hashes agree
/// on the low `depth` bits.
#[derive(Debug)]
struct Bucket<K, V> {
    /// Number of low-order hash bits shared by every key in the bucket.
    depth: usize,

    /// Stored pairs. Keys are unique; the order carries no meaning.
    items: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(depth: usize, bucket_size: usize) -> Self {
        Self {
            depth,
            items: Vec::with_capacity(bucket_size),
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.items
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|(_, value)| value)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.items
            .iter_mut()
            .find(|(stored, _)| stored == key)
            .map(|(_, value)| value)
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.items.iter().position(|(stored, _)| stored == key) {
            Some(at) => {
                self.items.swap_remove(at);
                true
            }
            None => false,
        }
    }
}

struct Inner<K, V> {
    /// Maximum number of items per bucket.
    bucket_size: usize,

    /// Number of low-order hash bits used to index the directory.
    global_depth: usize,

    /// Directory of `2^global_depth` slots, each an index into `buckets`.
    /// Slots `i` and `j` alias the same bucket `b` exactly when `i` and `j`
    /// agree on the low `b.depth` bits.
    directory: Vec<usize>,

    /// Bucket arena. Buckets are only ever added (a split turns one bucket
    /// into two, reusing the old arena slot for one of the halves), so the
    /// arena length is the live bucket count.
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> Inner<K, V> {
    /// Mask selecting the directory bits of a hash.
    fn dir_mask(&self) -> usize {
        (1 << self.global_depth) - 1
    }
}

/// Concurrent extendible hash table.
///
/// A key/value map that grows bucket by bucket. Lookups return copies of
/// the stored values; insertion is an upsert and never fails. The table is
/// internally synchronized: lookups and depth accessors share a read lock,
/// mutations take the write lock for their whole duration.
///
/// Keys are hashed with [`ahash::RandomState`] unless a different
/// [`BuildHasher`] is supplied via
/// [`with_hasher`](ExtendibleHashTable::with_hasher).
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    inner: Arc<RwLock<Inner<K, V>>>,
    hasher: S,
}

impl<K, V> ExtendibleHashTable<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Creates a table whose buckets hold up to `bucket_size` pairs.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    /// Creates a table whose buckets hold up to `bucket_size` pairs,
    /// hashing keys with `hasher`.
    ///
    /// The split loop terminates only if keys eventually disagree on some
    /// low hash bit: a hasher mapping many keys to the same machine-word
    /// hash makes a full bucket unsplittable, and inserting into it would
    /// double the directory without bound. Hashers that distribute keys
    /// uniformly over `u64` (the default one included) are safe.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size >= 1, "bucket_size must be at least 1");
        Self {
            inner: Arc::new(RwLock::new(Inner {
                bucket_size,
                global_depth: 0,
                directory: vec![0],
                buckets: vec![Bucket::new(0, bucket_size)],
            })),
            hasher,
        }
    }

    fn hash(&self, key: &K) -> usize {
        self.hasher.hash_one(key) as usize
    }

    /// Looks up the value stored for `key`, returning a copy of it.
    pub fn find(&self, key: &K) -> Option<V> {
        let inner = self.inner.read();
        let target = inner.directory[self.hash(key) & inner.dir_mask()];
        inner.buckets[target].get(key).cloned()
    }

    /// Removes the mapping for `key`, reporting whether it existed.
    ///
    /// Buckets are never merged: removing every key from a bucket leaves
    /// the empty bucket and the directory as they are.
    pub fn remove(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        let target = inner.directory[self.hash(key) & inner.dir_mask()];
        inner.buckets[target].remove(key)
    }

    /// Inserts or overwrites the mapping for `key`.
    ///
    /// When the target bucket is full and does not yet contain `key`, the
    /// bucket is split, doubling the directory whenever the bucket already
    /// uses every directory bit, until the key's bucket has room.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.write();
        let hash = self.hash(&key);

        loop {
            let bucket_size = inner.bucket_size;
            let target = inner.directory[hash & inner.dir_mask()];
            let bucket = &mut inner.buckets[target];

            if let Some(stored) = bucket.get_mut(&key) {
                *stored = value;
                return;
            }
            if bucket.items.len() < bucket_size {
                bucket.items.push((key, value));
                return;
            }

            self.split(&mut inner, target);
        }
    }

    /// Splits the bucket at arena index `target` along its first unused
    /// hash bit.
    fn split(&self, inner: &mut Inner<K, V>, target: usize) {
        let depth = inner.buckets[target].depth;

        // A bucket already using every directory bit needs the directory to
        // grow first: append-copy the directory so that each new slot
        // aliases the bucket its low bits already point at.
        if depth == inner.global_depth {
            inner.directory.extend_from_within(..);
            inner.global_depth += 1;
        }

        // Partition the items on the first hash bit the bucket has not
        // consumed yet. The old arena slot keeps the `bit == 0` half; the
        // `bit == 1` half moves to a fresh bucket.
        let mask = 1usize << depth;
        let items = mem::take(&mut inner.buckets[target].items);
        inner.buckets[target].depth = depth + 1;
        let sibling = inner.buckets.len();
        inner.buckets.push(Bucket::new(depth + 1, inner.bucket_size));

        for (key, value) in items {
            let half = if self.hash(&key) & mask == 0 {
                target
            } else {
                sibling
            };
            inner.buckets[half].items.push((key, value));
        }

        // Redirect the directory slots that aliased the split bucket: the
        // ones with the distinguishing bit set now point at the sibling.
        for (slot, bucket) in inner.directory.iter_mut().enumerate() {
            if *bucket == target && slot & mask != 0 {
                *bucket = sibling;
            }
        }
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S> {
    /// Number of low-order hash bits currently used to index the
    /// directory. The directory holds `1 << global_depth()` slots.
    pub fn global_depth(&self) -> usize {
        self.inner.read().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `dir_index`:
    /// the number of low-order hash bits its keys agree on.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is not below the directory length.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let inner = self.inner.read();
        inner.buckets[inner.directory[dir_index]].depth
    }

    /// Number of distinct buckets backing the directory. Each split adds
    /// exactly one.
    pub fn num_buckets(&self) -> usize {
        self.inner.read().buckets.len()
    }
}
