//! Safe `HashMap`-shaped wrapper around [`super::RawRcTable`]: the raw
//! engine only knows slots and hashes, this layer owns the `Hash`/`Eq`
//! contract and the default hasher.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, Hasher};

use fxhash::FxBuildHasher;

use crate::group::{GroupOps, Group16};
use crate::hash_split::{HashSplit, ShiftHashSplit};
use crate::prober::{Pow2Prober, Prober};
use crate::sizing::{PowerOfTwoSizing, SizingPolicy};

use super::{RawRcTable, RcIter};

#[inline]
fn make_hash<Q, B>(hash_builder: &B, value: &Q) -> u64
where
    Q: Hash + ?Sized,
    B: BuildHasher,
{
    let mut hasher = hash_builder.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

/// A `key -> value` map over the RC engine. Generic over the hasher and
/// every policy axis so a caller can swap short/long-hash derivation,
/// group growth, and probing independently, per the source's
/// trait-level policy composition; `Group16`/`ShiftHashSplit`/
/// `PowerOfTwoSizing`/`Pow2Prober` is the default, fastest combination.
pub struct RcHashMap<
    K,
    V,
    B = FxBuildHasher,
    H = ShiftHashSplit,
    Sz = PowerOfTwoSizing,
    Pr = Pow2Prober,
    G = Group16,
> where
    G: GroupOps,
    H: HashSplit,
    Sz: SizingPolicy,
    Pr: Prober,
{
    raw: RawRcTable<(K, V), G, H, Sz, Pr>,
    hash_builder: B,
}

impl<K, V> RcHashMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    pub fn with_capacity(capacity: usize) -> crate::error::Result<Self> {
        Self::with_capacity_and_hasher(capacity, FxBuildHasher::default())
    }
}

impl<K, V> Default for RcHashMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, B, H, Sz, Pr, G> RcHashMap<K, V, B, H, Sz, Pr, G>
where
    K: Hash + Eq,
    B: BuildHasher,
    G: GroupOps,
    H: HashSplit,
    Sz: SizingPolicy,
    Pr: Prober,
{
    pub fn with_hasher(hash_builder: B) -> Self {
        RcHashMap {
            raw: RawRcTable::new(false),
            hash_builder,
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: B) -> crate::error::Result<Self> {
        Ok(RcHashMap {
            raw: RawRcTable::with_capacity(capacity, false)?,
            hash_builder,
        })
    }

    /// Selects `Group15`'s classed-bitmap overflow encoding instead of the
    /// default single-flag encoding. Only meaningful when `G = Group15`;
    /// a no-op otherwise since `Group16` never consults the tracker. Must
    /// be called before the table's first insert: it rebuilds the
    /// overflow tracker for the table's current group count, so calling
    /// it after elements are already overflow-marked discards those marks.
    pub fn with_classed_overflow(mut self) -> Self {
        self.raw.set_classed_overflow(true);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = make_hash(&self.hash_builder, &key);
        let hash_builder = &self.hash_builder;
        let mut key_slot = Some(key);
        let mut value_slot = Some(value);
        let (slot_index, is_new) = self
            .raw
            .insert(
                hash,
                |existing| existing.0 == *key_slot.as_ref().unwrap(),
                || (key_slot.take().unwrap(), value_slot.take().unwrap()),
                |pair| make_hash(hash_builder, &pair.0),
            )
            .expect("capacity overflow during insert");
        if is_new {
            None
        } else {
            let new_value = value_slot.take().unwrap();
            Some(std::mem::replace(&mut self.raw.slot_mut(slot_index).1, new_value))
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        let slot_index = self.raw.find(hash, |pair| pair.0.borrow() == key)?;
        Some(&self.raw.slot(slot_index).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        let slot_index = self.raw.find(hash, |pair| pair.0.borrow() == key)?;
        Some(&mut self.raw.slot_mut(slot_index).1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        let (_, value) = self.raw.remove(hash, |pair| pair.0.borrow() == key)?;
        Some(value)
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        RcIterAdapter(self.raw.iter())
    }
}

struct RcIterAdapter<'a, T, G>(RcIter<'a, T, G>);

impl<'a, K, V, G: GroupOps> Iterator for RcIterAdapter<'a, (K, V), G> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_test() {
        let mut map: RcHashMap<u64, u64> = RcHashMap::new();
        assert_eq!(map.insert(1, 10), None);
        assert_eq!(map.insert(2, 20), None);
        assert_eq!(map.get(&1), Some(&10));
        assert_eq!(map.insert(1, 11), Some(10));
        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.remove(&2), Some(20));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut map: RcHashMap<u64, u64> = RcHashMap::with_capacity(4).unwrap();
        for k in 0..1000u64 {
            map.insert(k, k);
        }
        assert_eq!(map.len(), 1000);
        assert!(map.capacity() >= 1000);
        for k in 0..1000u64 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }
}
