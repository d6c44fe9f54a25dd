//! Coalesced hashing: an address region of bucket heads plus a cellar of
//! overflow nodes, linked by explicit next-indices instead of the
//! source's tagged pointers. Grounded in
//! `foa_unordered_coalesced.hpp`'s `coalesced_set_node_array` and
//! `foa_unordered_coalesced_set`; Rust shape (index-based chains, a
//! `Vec<Slot<T>>` instead of a raw node array) follows the same
//! parallel-storage approach as [`crate::rc::RawRcTable`].

use crate::error::{RcHashError, Result};

pub mod map;

/// No-next sentinel, matching the source's pointer-tag "no next" state.
const NIL: u32 = u32::MAX;

/// Which flavour of node this slot holds (source: simple vs hcached
/// coalesced nodes). `Hcached` additionally caches the full hash so
/// rehash and long-chain traversal can skip re-hashing the key; both
/// flavours share the same index-based "next" representation, re-
/// expressing the source's low-bit pointer tag as an explicit enum
/// field instead of reinterpreting a pointer's spare bits.
enum Occupant<T> {
    Empty { next_free: u32 },
    Simple { value: T, next: u32 },
    Hcached { value: T, hash: u64, next: u32 },
}

impl<T> Occupant<T> {
    #[inline]
    fn is_empty(&self) -> bool {
        matches!(self, Occupant::Empty { .. })
    }

    #[inline]
    fn value(&self) -> Option<&T> {
        match self {
            Occupant::Empty { .. } => None,
            Occupant::Simple { value, .. } | Occupant::Hcached { value, .. } => Some(value),
        }
    }

    /// Chain-next: which node a bucket's collision chain continues to.
    #[inline]
    fn next(&self) -> u32 {
        match self {
            Occupant::Empty { .. } => NIL,
            Occupant::Simple { next, .. } | Occupant::Hcached { next, .. } => *next,
        }
    }

    #[inline]
    fn set_next(&mut self, n: u32) {
        match self {
            Occupant::Empty { .. } => {}
            Occupant::Simple { next, .. } | Occupant::Hcached { next, .. } => *next = n,
        }
    }

    /// Free-list next: only meaningful while this slot is `Empty` and
    /// linked into the cellar's free list.
    #[inline]
    fn free_next(&self) -> u32 {
        match self {
            Occupant::Empty { next_free } => *next_free,
            _ => NIL,
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Occupant::Empty { .. } => None,
            Occupant::Simple { value, .. } | Occupant::Hcached { value, .. } => Some(value),
        }
    }
}

/// Whether new nodes cache their full hash alongside the value (source:
/// `hcached_coalesced_set_node`) or not (`simple_coalesced_set_node`).
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum NodeFlavor {
    Simple,
    Hcached,
}

/// Coalesced table: an address region sized to the element count (bucket
/// heads, one per hash bucket) followed by a cellar used only to host
/// collision chains. Insertion is VICH ("varied insertion coalesced
/// hashing"): a new key always takes an address-region slot if its own
/// bucket head is free; otherwise it takes a free cellar slot and links
/// it onto the bucket's chain, without ever evicting an already-placed
/// element.
pub struct CoalescedTable<T> {
    slots: Vec<Occupant<T>>,
    address_region_len: usize,
    free_list_head: u32,
    /// One past the highest cellar index ever handed out ("top pointer"
    /// in the source): free-list entries below this line have been used
    /// and released at least once; above it, a slot has never been
    /// touched and its `free_next` is meaningless.
    cellar_top: u32,
    len: usize,
    flavor: NodeFlavor,
}

impl<T> CoalescedTable<T> {
    pub fn new(flavor: NodeFlavor) -> Self {
        CoalescedTable {
            slots: Vec::new(),
            address_region_len: 0,
            free_list_head: NIL,
            cellar_top: 0,
            len: 0,
            flavor,
        }
    }

    pub fn with_capacity(capacity: usize, flavor: NodeFlavor) -> Result<Self> {
        let mut table = Self::new(flavor);
        if capacity > 0 {
            table.init(capacity)?;
        }
        Ok(table)
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
        self.address_region_len
    }

    /// Lays out a fresh, empty table sized for `capacity` elements.
    /// Never called on a table that already holds elements.
    fn init(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(self.is_empty());
        let address_region_len = capacity.max(1);
        let cellar_len = address_region_len / 2 + 1;
        let total = address_region_len
            .checked_add(cellar_len)
            .ok_or(RcHashError::CapacityOverflow)?;
        let mut slots = Vec::with_capacity(total);
        for _ in 0..total {
            slots.push(Occupant::Empty { next_free: NIL });
        }
        self.slots = slots;
        self.address_region_len = address_region_len;
        self.free_list_head = NIL;
        self.cellar_top = address_region_len as u32;
        self.len = 0;
        Ok(())
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) % self.address_region_len.max(1)
    }

    fn alloc_cellar_slot(&mut self) -> Option<u32> {
        if self.free_list_head != NIL {
            let idx = self.free_list_head;
            self.free_list_head = self.slots[idx as usize].free_next();
            return Some(idx);
        }
        if (self.cellar_top as usize) < self.slots.len() {
            let idx = self.cellar_top;
            self.cellar_top += 1;
            return Some(idx);
        }
        None
    }

    fn free_cellar_slot(&mut self, idx: u32) {
        self.slots[idx as usize] = Occupant::Empty {
            next_free: self.free_list_head,
        };
        self.free_list_head = idx;
    }

    #[inline]
    pub fn slot(&self, index: usize) -> &T {
        self.slots[index].value().expect("slot index names a live element")
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> &mut T {
        self.slots[index].value_mut().expect("slot index names a live element")
    }

    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<&T> {
        if self.address_region_len == 0 {
            return None;
        }
        let head = self.bucket_of(hash);
        if self.slots[head].is_empty() {
            return None;
        }
        let mut current = head;
        loop {
            if let Some(v) = self.slots[current].value() {
                if eq(v) {
                    return Some(v);
                }
            }
            match self.slots[current].next() {
                NIL => return None,
                next => current = next as usize,
            }
        }
    }

    /// VICH insertion: if `eq` matches along the bucket chain, returns
    /// that slot unchanged (`is_new = false`); otherwise places
    /// `make_value()` in the bucket's address-region head if free, or a
    /// freshly allocated cellar slot linked onto the chain's tail.
    /// `hash_of` re-derives every live element's hash, used only if the
    /// cellar has run dry and a growth rehash is needed first.
    pub fn insert(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
        make_value: impl FnOnce() -> T,
        hash_of: impl Fn(&T) -> u64,
    ) -> Result<(usize, bool)> {
        if self.address_region_len == 0 || self.needs_growth() {
            self.rehash_with(&hash_of)?;
        }
        let head = self.bucket_of(hash);
        if self.slots[head].is_empty() {
            self.place(head, hash, make_value());
            return Ok((head, true));
        }
        let mut current = head;
        loop {
            if let Some(v) = self.slots[current].value() {
                if eq(v) {
                    return Ok((current, false));
                }
            }
            match self.slots[current].next() {
                NIL => break,
                next => current = next as usize,
            }
        }
        let new_idx = match self.alloc_cellar_slot() {
            Some(idx) => idx,
            None => {
                self.rehash_with(&hash_of)?;
                return self.insert(hash, eq, make_value, hash_of);
            }
        };
        self.place(new_idx as usize, hash, make_value());
        self.slots[current].set_next(new_idx);
        Ok((new_idx as usize, true))
    }

    fn place(&mut self, idx: usize, hash: u64, value: T) {
        self.slots[idx] = match self.flavor {
            NodeFlavor::Simple => Occupant::Simple { value, next: NIL },
            NodeFlavor::Hcached => Occupant::Hcached {
                value,
                hash,
                next: NIL,
            },
        };
        self.len += 1;
    }

    pub fn remove(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        if self.address_region_len == 0 {
            return None;
        }
        let head = self.bucket_of(hash);
        if self.slots[head].is_empty() {
            return None;
        }
        let mut prev: Option<usize> = None;
        let mut current = head;
        loop {
            let is_match = self.slots[current].value().map_or(false, |v| eq(v));
            if is_match {
                let next = self.slots[current].next();
                let removed = std::mem::replace(
                    &mut self.slots[current],
                    Occupant::Empty { next_free: NIL },
                );
                if current == head {
                    if next != NIL {
                        // Pull the first chained node up into the head
                        // slot so the bucket's address-region entry is
                        // never left empty while its chain is nonempty.
                        let pulled = std::mem::replace(
                            &mut self.slots[next as usize],
                            Occupant::Empty { next_free: NIL },
                        );
                        self.slots[head] = pulled;
                        self.free_cellar_slot(next);
                    }
                } else if let Some(p) = prev {
                    self.slots[p].set_next(next);
                    self.free_cellar_slot(current as u32);
                }
                self.len -= 1;
                return match removed {
                    Occupant::Simple { value, .. } | Occupant::Hcached { value, .. } => {
                        Some(value)
                    }
                    Occupant::Empty { .. } => None,
                };
            }
            match self.slots[current].next() {
                NIL => return None,
                next => {
                    prev = Some(current);
                    current = next as usize;
                }
            }
        }
    }

    #[inline]
    fn needs_growth(&self) -> bool {
        self.len + 1 > self.address_region_len
            && self.free_list_head == NIL
            && self.cellar_top as usize >= self.slots.len()
    }


    /// Rebuilds the table at roughly double its current address-region
    /// size, using `hash_of` to re-derive each live element's bucket.
    pub fn rehash_with(&mut self, hash_of: impl Fn(&T) -> u64) -> Result<()> {
        let new_address_len = self.address_region_len.max(1) * 2;
        let new_cellar_len = new_address_len / 2 + 1;
        let new_total = new_address_len
            .checked_add(new_cellar_len)
            .ok_or(RcHashError::CapacityOverflow)?;
        log::debug!(
            "coalesced table rehash: {} -> {} address-region buckets ({} live elements)",
            self.address_region_len,
            new_address_len,
            self.len
        );
        let mut new_slots = Vec::with_capacity(new_total);
        for _ in 0..new_total {
            new_slots.push(Occupant::Empty { next_free: NIL });
        }
        let old_slots = std::mem::replace(&mut self.slots, new_slots);
        self.address_region_len = new_address_len;
        self.free_list_head = NIL;
        self.cellar_top = new_address_len as u32;
        self.len = 0;
        for occupant in old_slots {
            match occupant {
                Occupant::Empty { .. } => {}
                Occupant::Simple { value, .. } | Occupant::Hcached { value, .. } => {
                    let hash = hash_of(&value);
                    self.insert_during_rehash(hash, value);
                }
            }
        }
        Ok(())
    }

    fn insert_during_rehash(&mut self, hash: u64, value: T) {
        let head = self.bucket_of(hash);
        if self.slots[head].is_empty() {
            self.place(head, hash, value);
            return;
        }
        let mut current = head;
        loop {
            match self.slots[current].next() {
                NIL => break,
                next => current = next as usize,
            }
        }
        let new_idx = self
            .alloc_cellar_slot()
            .expect("cellar sized to absorb every element during rehash");
        self.place(new_idx as usize, hash, value);
        self.slots[current].set_next(new_idx);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|o| o.value())
    }
}
