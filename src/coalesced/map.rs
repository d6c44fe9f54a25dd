//! Safe `HashMap`-shaped wrapper around [`super::CoalescedTable`], in the
//! same shape as [`crate::rc::map::RcHashMap`].

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, Hasher};

use fxhash::FxBuildHasher;

use super::{CoalescedTable, NodeFlavor};

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

pub struct CoalescedMap<K, V, B = FxBuildHasher> {
    raw: CoalescedTable<(K, V)>,
    hash_builder: B,
}

impl<K, V> CoalescedMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(flavor: NodeFlavor) -> Self {
        CoalescedMap {
            raw: CoalescedTable::new(flavor),
            hash_builder: FxBuildHasher::default(),
        }
    }

    pub fn with_capacity(capacity: usize, flavor: NodeFlavor) -> crate::error::Result<Self> {
        Ok(CoalescedMap {
            raw: CoalescedTable::with_capacity(capacity, flavor)?,
            hash_builder: FxBuildHasher::default(),
        })
    }
}

impl<K, V, B> CoalescedMap<K, V, B>
where
    K: Hash + Eq,
    B: BuildHasher,
{
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
        self.raw.find(hash, |pair| pair.0.borrow() == key).map(|pair| &pair.1)
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

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.raw.iter().map(|(k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_test() {
        let mut map: CoalescedMap<u64, u64> = CoalescedMap::new(NodeFlavor::Simple);
        assert_eq!(map.insert(1, 10), None);
        assert_eq!(map.insert(1, 11), Some(10));
        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.remove(&1), Some(11));
        assert_eq!(map.get(&1), None);
    }

    #[test]
    fn cellar_overflow_chains_resolve_correctly() {
        let mut map: CoalescedMap<u64, u64> = CoalescedMap::with_capacity(8, NodeFlavor::Hcached).unwrap();
        for k in 0..200u64 {
            map.insert(k, k * 2);
        }
        for k in 0..200u64 {
            assert_eq!(map.get(&k), Some(&(k * 2)));
        }
    }
}
