use std::collections::HashMap as StdHashMap;

use proptest::prelude::*;
use rc_hash_bench::group::Group15;
use rc_hash_bench::{CoalescedMap, HopscotchMap, NodeFlavor, RcHashMap};

#[test]
fn rc_hash_map_basic_round_trip() {
    let mut map: RcHashMap<u64, u64> = RcHashMap::new();
    for k in 0..500u64 {
        assert_eq!(map.insert(k, k * 2), None);
    }
    assert_eq!(map.len(), 500);
    for k in 0..500u64 {
        assert_eq!(map.get(&k), Some(&(k * 2)));
    }
}

#[test]
fn rc_hash_map_overwrite_returns_old_value() {
    let mut map: RcHashMap<&str, i32> = RcHashMap::new();
    assert_eq!(map.insert("a", 1), None);
    assert_eq!(map.insert("a", 2), Some(1));
    assert_eq!(map.get("a"), Some(&2));
    assert_eq!(map.len(), 1);
}

#[test]
fn rc_hash_map_erase_insert_idempotence() {
    let mut map: RcHashMap<u64, u64> = RcHashMap::new();
    for k in 0..64u64 {
        map.insert(k, k);
    }
    assert_eq!(map.remove(&10), Some(10));
    assert_eq!(map.get(&10), None);
    assert_eq!(map.insert(10, 10), None);
    assert_eq!(map.get(&10), Some(&10));
    assert_eq!(map.len(), 64);
}

#[test]
fn rc_hash_map_forced_rehash_preserves_entries() {
    let mut map: RcHashMap<u64, u64> = RcHashMap::with_capacity(4).unwrap();
    for k in 0..5000u64 {
        map.insert(k, k.wrapping_mul(31));
    }
    assert_eq!(map.len(), 5000);
    for k in 0..5000u64 {
        assert_eq!(map.get(&k), Some(&k.wrapping_mul(31)));
    }
}

#[test]
fn rc_hash_map_iteration_visits_every_live_key_once() {
    let mut map: RcHashMap<u64, u64> = RcHashMap::new();
    for k in 0..200u64 {
        map.insert(k, k);
    }
    for k in (0..200u64).step_by(3) {
        map.remove(&k);
    }
    let mut seen: StdHashMap<u64, u64> = StdHashMap::new();
    for (k, v) in map.iter() {
        assert!(seen.insert(*k, *v).is_none(), "key {} yielded twice", k);
    }
    assert_eq!(seen.len(), map.len());
    for (&k, &v) in seen.iter() {
        assert_eq!(v, k);
        assert!(k % 3 != 0);
    }
}

#[test]
fn rc_hash_map_load_factor_bound_holds_after_growth() {
    let mut map: RcHashMap<u64, u64> = RcHashMap::new();
    for k in 0..10_000u64 {
        map.insert(k, k);
        assert!(map.len() as f32 <= map.capacity() as f32 * 0.875 + 1.0);
    }
}

#[test]
fn rc_hash_map_group15_classed_overflow_variant() {
    type Group15Map = RcHashMap<
        u64,
        u64,
        fxhash::FxBuildHasher,
        rc_hash_bench::hash_split::ShiftHashSplit,
        rc_hash_bench::sizing::PowerOfTwoSizing,
        rc_hash_bench::prober::Pow2Prober,
        Group15,
    >;
    let mut map: Group15Map =
        Group15Map::with_hasher(fxhash::FxBuildHasher::default()).with_classed_overflow();
    for k in 0..1000u64 {
        map.insert(k, k + 1);
    }
    for k in 0..1000u64 {
        assert_eq!(map.get(&k), Some(&(k + 1)));
    }
    assert_eq!(map.len(), 1000);
}

#[test]
fn coalesced_map_basic_round_trip() {
    let mut map: CoalescedMap<u64, u64> = CoalescedMap::new(NodeFlavor::Simple);
    for k in 0..2000u64 {
        map.insert(k, k * 3);
    }
    assert_eq!(map.len(), 2000);
    for k in 0..2000u64 {
        assert_eq!(map.get(&k), Some(&(k * 3)));
    }
    for k in (0..2000u64).step_by(2) {
        assert_eq!(map.remove(&k), Some(k * 3));
    }
    assert_eq!(map.len(), 1000);
    for k in (1..2000u64).step_by(2) {
        assert_eq!(map.get(&k), Some(&(k * 3)));
    }
}

#[test]
fn coalesced_map_hcached_flavor_round_trip() {
    let mut map: CoalescedMap<u64, u64> = CoalescedMap::new(NodeFlavor::Hcached);
    for k in 0..2000u64 {
        map.insert(k, k);
    }
    for k in 0..2000u64 {
        assert_eq!(map.get(&k), Some(&k));
    }
}

#[test]
fn hopscotch_map_basic_round_trip() {
    let mut map: HopscotchMap<u64, u64, 16> = HopscotchMap::new();
    for k in 0..3000u64 {
        map.insert(k, k + 7);
    }
    assert_eq!(map.len(), 3000);
    for k in 0..3000u64 {
        assert_eq!(map.get(&k), Some(&(k + 7)));
    }
}

#[test]
fn long_hop_map_basic_round_trip() {
    let mut map: HopscotchMap<u64, u64, 64> = HopscotchMap::new();
    for k in 0..3000u64 {
        map.insert(k, k);
    }
    for k in 0..3000u64 {
        assert_eq!(map.get(&k), Some(&k));
    }
    for k in (0..3000u64).step_by(5) {
        assert_eq!(map.remove(&k), Some(k));
    }
    assert_eq!(map.len(), 2400);
}

proptest! {
    #[test]
    fn prop_round_trip_matches_std_hashmap(
        ops in prop::collection::vec((0u64..200, 0u64..1000, 0u8..3), 0..400)
    ) {
        let mut map: RcHashMap<u64, u64> = RcHashMap::new();
        let mut model: StdHashMap<u64, u64> = StdHashMap::new();
        for (k, v, op) in ops {
            match op {
                0 => {
                    prop_assert_eq!(map.insert(k, v), model.insert(k, v));
                }
                1 => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                _ => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
            }
        }
        prop_assert_eq!(map.len(), model.len());
        for (&k, &v) in model.iter() {
            prop_assert_eq!(map.get(&k), Some(&v));
        }
    }

    #[test]
    fn prop_find_on_absent_key_terminates_and_fails(
        present in prop::collection::vec(0u64..500, 0..200),
        probe in 0u64..500
    ) {
        let mut map: RcHashMap<u64, u64> = RcHashMap::new();
        for k in &present {
            map.insert(*k, *k);
        }
        let found = map.get(&probe);
        if present.contains(&probe) {
            prop_assert_eq!(found, Some(&probe));
        } else {
            prop_assert_eq!(found, None);
        }
    }

    #[test]
    fn prop_erase_insert_idempotence(
        keys in prop::collection::hash_set(0u64..500, 1..200),
        victim_idx in 0usize..500,
    ) {
        let keys: Vec<u64> = keys.into_iter().collect();
        let victim = keys[victim_idx % keys.len()];
        let mut once: RcHashMap<u64, u64> = RcHashMap::new();
        for &k in &keys {
            once.insert(k, k);
        }

        let mut twice: RcHashMap<u64, u64> = RcHashMap::new();
        for &k in &keys {
            twice.insert(k, k);
        }
        twice.remove(&victim);
        twice.insert(victim, victim);

        prop_assert_eq!(once.len(), twice.len());
        for &k in &keys {
            prop_assert_eq!(once.get(&k), twice.get(&k));
        }
    }
}
