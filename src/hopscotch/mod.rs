//! Hopscotch hashing: every element lives within a bounded neighbourhood
//! of its home bucket, and insertion displaces earlier elements forward
//! to make room rather than probing outward indefinitely. Grounded in
//! `foa_unordered_hopscotch.hpp`'s `bucket`/`bucket_array` and
//! `foa_unordered_hopscotch_set`.
//!
//! The source packs each slot's displacement into a 4-bit "hop nibble"
//! local to its owning bucket and relies on a specific out-of-range
//! truncation (`reset()` writing a value one past the 4-bit range) to
//! mean "no element here". This module re-expresses that as an explicit
//! `Option<u32>` owner per slot instead of reinterpreting a packed
//! bitfield's overflow behaviour, per the source's own guidance that
//! such pointer/bit tricks should become explicit state in a safe
//! rewrite. The neighbourhood width is a const generic: `Hopscotch` fixes
//! it at the source's 16, and `LongHop` (the "long hops" sibling
//! variant, grounded in `foa_unordered_longhop.hpp`'s wider per-element
//! first/next displacement fields) just picks a larger one, rather than
//! re-deriving a second packed-bitfield container from scratch.

use crate::error::{RcHashError, Result};

pub mod map;

/// Bounded hopscotch with the source's 16-slot neighbourhood.
pub type Hopscotch<T> = HopscotchTable<T, 16>;

/// The long-hop sibling: a wider neighbourhood, trading denser per-slot
/// bookkeeping (the source's packed first/next fields, here just a
/// larger explicit displacement) for far fewer resize-triggering
/// displacement failures.
pub type LongHop<T> = HopscotchTable<T, 64>;

struct Slot<T> {
    value: Option<T>,
    /// Home bucket of the element currently in this slot, if any.
    owner: Option<u32>,
}

/// A hopscotch table whose every live element sits within `N` slots
/// (forward, circularly) of its home bucket.
pub struct HopscotchTable<T, const N: usize> {
    slots: Vec<Slot<T>>,
    mask: usize,
    len: usize,
}

const MAX_LOAD_FACTOR: f32 = 0.875;

impl<T, const N: usize> HopscotchTable<T, N> {
    pub fn new() -> Self {
        HopscotchTable {
            slots: Vec::new(),
            mask: 0,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut table = Self::new();
        if capacity > 0 {
            let group_count = (capacity.max(1) as f32 / MAX_LOAD_FACTOR).ceil() as usize;
            table.init(group_count.next_power_of_two().max(N))?;
        }
        Ok(table)
    }

    fn init(&mut self, capacity: usize) -> Result<()> {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                value: None,
                owner: None,
            });
        }
        self.slots = slots;
        self.mask = capacity - 1;
        self.len = 0;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn home_of(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Forward circular distance from `a` to `b` in `0..capacity`.
    #[inline]
    fn forward_distance(&self, a: usize, b: usize) -> usize {
        (b + self.slots.len() - a) & self.mask
    }

    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let home = self.home_of(hash);
        for i in 0..N {
            let idx = (home + i) & self.mask;
            if self.slots[idx].owner == Some(home as u32) {
                if let Some(v) = &self.slots[idx].value {
                    if eq(v) {
                        return Some(idx);
                    }
                }
            }
        }
        None
    }

    #[inline]
    pub fn slot(&self, index: usize) -> &T {
        self.slots[index].value.as_ref().expect("slot index names a live element")
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> &mut T {
        self.slots[index].value.as_mut().expect("slot index names a live element")
    }

    pub fn insert(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
        make_value: impl FnOnce() -> T,
        hash_of: impl Fn(&T) -> u64,
    ) -> Result<(usize, bool)> {
        if self.needs_growth() {
            self.grow(&hash_of)?;
        }
        let home = self.home_of(hash);
        for i in 0..N {
            let idx = (home + i) & self.mask;
            if self.slots[idx].owner == Some(home as u32) {
                let matched = self.slots[idx].value.as_ref().map_or(false, |v| eq(v));
                if matched {
                    return Ok((idx, false));
                }
            }
        }
        let free_idx = match self.find_empty_slot(home) {
            Some(idx) => idx,
            None => {
                self.grow(&hash_of)?;
                return self.insert(hash, eq, make_value, hash_of);
            }
        };
        let placed = match self.displace_towards(home, free_idx) {
            Some(idx) => idx,
            None => {
                // Displacement exhausted: force a rehash, and if the
                // rehash itself cannot make room, propagate as a generic
                // capacity error.
                self.grow(&hash_of)?;
                return self.insert(hash, eq, make_value, hash_of);
            }
        };
        self.slots[placed].value = Some(make_value());
        self.slots[placed].owner = Some(home as u32);
        self.len += 1;
        Ok((placed, true))
    }

    /// Linear scan for the first empty slot starting at `home`, capped at
    /// the table's own capacity, which is the furthest it could ever
    /// usefully travel, so the cap never changes observable behaviour on
    /// a table that still has room.
    fn find_empty_slot(&self, home: usize) -> Option<usize> {
        let capacity = self.slots.len();
        for dist in 0..capacity {
            let idx = (home + dist) & self.mask;
            if self.slots[idx].value.is_none() {
                return Some(idx);
            }
        }
        None
    }

    /// Hops the empty slot at `free_idx` back towards `home`, displacing
    /// one earlier element per step, until it is within `N` of `home` (or
    /// no further displacement is possible, signalling exhaustion).
    fn displace_towards(&mut self, home: usize, mut free_idx: usize) -> Option<usize> {
        while self.forward_distance(home, free_idx) >= N {
            let mut hopped = false;
            let capacity = self.slots.len();
            for back in 1..N {
                let p = (free_idx + capacity - back) & self.mask;
                if let Some(owner) = self.slots[p].owner {
                    if self.forward_distance(owner as usize, free_idx) < N {
                        log::trace!("hopscotch displacing slot {} towards home {}", p, home);
                        self.slots[free_idx].value = self.slots[p].value.take();
                        self.slots[free_idx].owner = Some(owner);
                        self.slots[p].owner = None;
                        free_idx = p;
                        hopped = true;
                        break;
                    }
                }
            }
            if !hopped {
                log::trace!("hopscotch displacement exhausted for home {}", home);
                return None;
            }
        }
        Some(free_idx)
    }

    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let idx = self.find(hash, eq)?;
        self.slots[idx].owner = None;
        self.len -= 1;
        self.slots[idx].value.take()
    }

    #[inline]
    fn needs_growth(&self) -> bool {
        self.slots.is_empty()
            || (self.len + 1) as f32 > self.slots.len() as f32 * MAX_LOAD_FACTOR
    }

    fn grow(&mut self, hash_of: &impl Fn(&T) -> u64) -> Result<()> {
        let new_capacity = if self.slots.is_empty() {
            N.next_power_of_two()
        } else {
            (self.slots.len() * 2).next_power_of_two()
        };
        if new_capacity == 0 || new_capacity > isize::MAX as usize {
            return Err(RcHashError::CapacityOverflow);
        }
        log::debug!(
            "hopscotch table rehash: {} -> {} slots ({} live elements)",
            self.slots.len(),
            new_capacity,
            self.len
        );
        let mut new_slots = Vec::with_capacity(new_capacity);
        for _ in 0..new_capacity {
            new_slots.push(Slot {
                value: None,
                owner: None,
            });
        }
        let old_slots = std::mem::replace(&mut self.slots, new_slots);
        self.mask = new_capacity - 1;
        self.len = 0;
        for mut slot in old_slots {
            if let Some(value) = slot.value.take() {
                let hash = hash_of(&value);
                self.insert_during_rehash(hash, value);
            }
        }
        Ok(())
    }

    fn insert_during_rehash(&mut self, hash: u64, value: T) {
        let home = self.home_of(hash);
        let free_idx = self
            .find_empty_slot(home)
            .expect("freshly doubled table has room for every previously live element");
        let placed = self
            .displace_towards(home, free_idx)
            .expect("freshly doubled table never exhausts displacement during rehash");
        self.slots[placed].value = Some(value);
        self.slots[placed].owner = Some(home as u32);
        self.len += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}
