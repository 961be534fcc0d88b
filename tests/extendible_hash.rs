use {
    bufcore::ExtendibleHashTable,
    rand::Rng,
    std::{
        collections::HashMap,
        hash::{BuildHasher, Hasher},
        sync::Arc,
        thread,
    },
};

/// Hashes integer keys to themselves, making directory indexes (and hence
/// splits) predictable.
#[derive(Clone, Default)]
struct IdentityState;

struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _bytes: &[u8]) {
        unimplemented!("identity hashing is defined for integer keys only");
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    fn write_usize(&mut self, n: usize) {
        self.0 = n as u64;
    }
}

impl BuildHasher for IdentityState {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

#[test]
fn split_and_grow() {
    let table = ExtendibleHashTable::with_hasher(2, IdentityState);

    // Two keys fit into the initial bucket; no directory growth yet.
    table.insert(1u64, 10);
    table.insert(2u64, 20);
    assert_eq!(0, table.global_depth());
    assert_eq!(1, table.num_buckets());

    // The third key forces one split: keys 1 and 2 disagree on the lowest
    // hash bit, so a single split makes room.
    table.insert(3u64, 30);
    assert_eq!(1, table.global_depth());
    assert_eq!(2, table.num_buckets());
    assert_eq!(1, table.local_depth(0));
    assert_eq!(1, table.local_depth(1));

    assert_eq!(Some(10), table.find(&1));
    assert_eq!(Some(20), table.find(&2));
    assert_eq!(Some(30), table.find(&3));
}

#[test]
fn insert_is_an_upsert() {
    let table = ExtendibleHashTable::new(2);

    table.insert(7u64, "a");
    table.insert(7u64, "b");
    assert_eq!(Some("b"), table.find(&7));
    assert_eq!(1, table.num_buckets());
    assert_eq!(0, table.global_depth());
}

#[test]
fn overwrite_does_not_split_a_full_bucket() {
    let table = ExtendibleHashTable::with_hasher(2, IdentityState);

    // Fill the single bucket, then overwrite both keys. Overwrites must
    // hit the stored pair even though the bucket has no free slot, and
    // must not grow the table.
    table.insert(0u64, "x");
    table.insert(2u64, "y");
    table.insert(2u64, "z");
    table.insert(0u64, "w");

    assert_eq!(Some("w"), table.find(&0));
    assert_eq!(Some("z"), table.find(&2));
    assert_eq!(1, table.num_buckets());
    assert_eq!(0, table.global_depth());
}

#[test]
fn remove_then_reinsert() {
    let table = ExtendibleHashTable::new(4);

    table.insert(5u64, "five");
    assert!(table.remove(&5));
    assert_eq!(None, table.find(&5));
    assert!(!table.remove(&5));

    table.insert(5u64, "five again");
    assert_eq!(Some("five again"), table.find(&5));
}

#[test]
fn chained_splits_on_shared_low_bits() {
    let table = ExtendibleHashTable::with_hasher(2, IdentityState);

    // All four keys agree on the low two hash bits, so making room for the
    // third one requires three consecutive splits: two of them double the
    // directory without separating the colliding keys.
    table.insert(0u64, 0);
    table.insert(4u64, 4);
    assert_eq!(0, table.global_depth());
    assert_eq!(1, table.num_buckets());

    table.insert(8u64, 8);
    assert_eq!(3, table.global_depth());
    assert_eq!(4, table.num_buckets());

    // Keys 4 and 12 land in the bucket split off at depth three; no
    // further growth is needed.
    table.insert(12u64, 12);
    assert_eq!(3, table.global_depth());
    assert_eq!(4, table.num_buckets());

    for key in [0u64, 4, 8, 12] {
        assert_eq!(Some(key), table.find(&key));
    }

    // Directory slots 0 and 4 reference the fully split buckets; the
    // intermediate splits left shallower buckets behind.
    assert_eq!(3, table.local_depth(0));
    assert_eq!(1, table.local_depth(1));
    assert_eq!(2, table.local_depth(2));
    assert_eq!(3, table.local_depth(4));
    for slot in 0..1 << table.global_depth() {
        assert!(table.local_depth(slot) <= table.global_depth());
    }
}

#[test]
fn empty_buckets_are_left_in_place() {
    let table = ExtendibleHashTable::with_hasher(1, IdentityState);

    table.insert(0u64, 0);
    table.insert(1u64, 1);
    assert_eq!(1, table.global_depth());
    assert_eq!(2, table.num_buckets());

    // Draining a bucket neither merges nor shrinks anything.
    assert!(table.remove(&0));
    assert_eq!(1, table.global_depth());
    assert_eq!(2, table.num_buckets());
    assert_eq!(None, table.find(&0));

    table.insert(0u64, 7);
    assert_eq!(Some(7), table.find(&0));
    assert_eq!(2, table.num_buckets());
}

#[test]
fn randomized_ops_match_model() {
    let table = ExtendibleHashTable::new(4);
    let mut model: HashMap<u64, u32> = HashMap::new();
    let mut rng = rand::thread_rng();

    // Keys are drawn from a small range on purpose: plenty of overwrites
    // and removals of existing keys.
    for round in 0..2000u32 {
        let key = rng.gen_range(0..200u64);
        if rng.gen_bool(0.6) {
            table.insert(key, round);
            model.insert(key, round);
        } else {
            assert_eq!(model.remove(&key).is_some(), table.remove(&key));
        }
    }

    for key in 0..200u64 {
        assert_eq!(model.get(&key).copied(), table.find(&key));
    }

    let global_depth = table.global_depth();
    for slot in 0..1 << global_depth {
        assert!(table.local_depth(slot) <= global_depth);
    }
}

#[test]
fn concurrent_insert_and_find() {
    let table = Arc::new(ExtendibleHashTable::new(4));

    let mut handles = vec![];
    for t in 0..8u64 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for key in (t * 1000)..(t * 1000 + 256) {
                table.insert(key, key * 2);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..8u64 {
        for key in (t * 1000)..(t * 1000 + 256) {
            assert_eq!(Some(key * 2), table.find(&key));
        }
    }

    let global_depth = table.global_depth();
    for slot in 0..1 << global_depth {
        assert!(table.local_depth(slot) <= global_depth);
    }
}
