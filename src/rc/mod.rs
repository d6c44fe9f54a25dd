//! The reduced-collision (RC) engine: an open-addressing table over
//! SIMD-comparable groups of control bytes, where a per-group overflow
//! indicator — not "stop at the first empty slot" — decides when a probe
//! sequence may give up. Grounded in the source's
//! `foa_unordered_rc_set`/`foa_unordered_rc_map`; Rust shape (separate
//! control/slot storage, closure-injected hash/equality, fallible
//! growth) grounded in `RawTable`-style open-addressing table cores.

pub mod map;

use std::mem::MaybeUninit;

use crate::error::{RcHashError, Result};
use crate::group::{GroupOps, OverflowTracker, SingleFlagOverflow, ClassBitmapOverflow, CONTROL_BYTES_PER_GROUP, SENTINEL};
use crate::hash_split::HashSplit;
use crate::hint::{likely, unlikely};
use crate::prober::Prober;
use crate::sizing::SizingPolicy;

/// Load factor ceiling shared by every sizing policy: a table never
/// carries more live elements than `capacity * MAX_LOAD_FACTOR`.
pub const MAX_LOAD_FACTOR: f32 = 0.875;

/// The unsafe core behind [`map::RcHashMap`]. Stores control bytes and
/// slots in two parallel arrays rather than a single allocation split by
/// manual pointer arithmetic, trading a little locality for code that is
/// easy to get right without a compiler in the loop.
pub struct RawRcTable<T, G, H, S, P>
where
    G: GroupOps,
    H: HashSplit,
    S: SizingPolicy,
    P: Prober,
{
    ctrl: Vec<u8>,
    slots: Vec<MaybeUninit<T>>,
    group_count: usize,
    len: usize,
    overflow: Box<dyn OverflowTracker>,
    classed_overflow: bool,
    _policies: std::marker::PhantomData<(G, H, S, P)>,
}

impl<T, G, H, S, P> RawRcTable<T, G, H, S, P>
where
    G: GroupOps,
    H: HashSplit,
    S: SizingPolicy,
    P: Prober,
{
    pub fn new(classed_overflow: bool) -> Self {
        RawRcTable {
            ctrl: Vec::new(),
            slots: Vec::new(),
            group_count: 0,
            len: 0,
            overflow: new_overflow_tracker(0, classed_overflow),
            classed_overflow,
            _policies: std::marker::PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize, classed_overflow: bool) -> Result<Self> {
        let mut table = Self::new(classed_overflow);
        if capacity > 0 {
            let group_count = S::size_for(capacity, G::WIDTH, MAX_LOAD_FACTOR);
            table.rehash_to(group_count, |_: &T| unreachable!())?;
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
        if self.group_count == 0 {
            0
        } else {
            self.group_count * G::WIDTH - 1
        }
    }

    /// Switches between the single-flag and classed-bitmap overflow
    /// trackers, rebuilding the tracker for the table's current group
    /// count. Only meaningful before any element has been inserted, since
    /// switching discards whatever overflow marks the previous tracker
    /// held.
    pub(crate) fn set_classed_overflow(&mut self, classed: bool) {
        self.classed_overflow = classed;
        self.overflow = new_overflow_tracker(self.group_count, classed);
    }

    #[inline]
    fn ctrl_ptr(&self, group_index: usize) -> *const u8 {
        unsafe { self.ctrl.as_ptr().add(group_index * CONTROL_BYTES_PER_GROUP) }
    }

    #[inline]
    fn ctrl_byte(&self, group_index: usize, offset: usize) -> u8 {
        self.ctrl[group_index * CONTROL_BYTES_PER_GROUP + offset]
    }

    #[inline]
    fn set_ctrl_byte(&mut self, group_index: usize, offset: usize, byte: u8) {
        self.ctrl[group_index * CONTROL_BYTES_PER_GROUP + offset] = byte;
    }

    #[inline]
    fn slot_index(&self, group_index: usize, offset: usize) -> usize {
        group_index * G::WIDTH + offset
    }

    #[inline]
    fn load_group(&self, group_index: usize) -> G {
        unsafe { G::load(self.ctrl_ptr(group_index)) }
    }

    /// RC's early-exit test: a group that still has an empty lane (or, for
    /// `Group15`, was never marked overflowed for this probe's fingerprint
    /// class) could not have been skipped by any prior insert of this key,
    /// so a miss here means the key is nowhere in the table.
    #[inline]
    fn should_stop_probe(&self, group_index: usize, group: G, short_hash: u8) -> bool {
        if G::WIDTH == 16 {
            group.match_empty().any_bit_set()
        } else {
            !self.overflow.is_overflowed(group_index, short_hash)
        }
    }

    #[inline]
    fn mark_group_overflowed(&mut self, group_index: usize, short_hash: u8) {
        if G::WIDTH != 16 {
            log::trace!("rc table marking group {} overflowed", group_index);
            self.overflow.mark_overflowed(group_index, short_hash);
        }
    }

    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.group_count == 0 {
            return None;
        }
        let (long_hash, short_hash) = H::split(hash);
        let adjusted = G::adjust_short_hash(short_hash);
        let initial_group = S::position_for(long_hash, self.group_count);
        let mut prober = P::new(initial_group, self.group_count);
        loop {
            let group_index = prober.current();
            let group = self.load_group(group_index);
            for offset in group.match_byte(adjusted) {
                let slot_index = self.slot_index(group_index, offset);
                let candidate = unsafe { self.slots[slot_index].assume_init_ref() };
                if likely(eq(candidate)) {
                    return Some(slot_index);
                }
            }
            if unlikely(self.should_stop_probe(group_index, group, short_hash)) {
                return None;
            }
            prober.advance();
        }
    }

    #[inline]
    pub fn slot(&self, index: usize) -> &T {
        unsafe { self.slots[index].assume_init_ref() }
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> &mut T {
        unsafe { self.slots[index].assume_init_mut() }
    }

    /// Looks up `hash` via `eq`, and only if it is not already present,
    /// places the value returned by `make_value` (called at most once, and
    /// only once the target slot is known — so `make_value` may move data
    /// that `eq` still needs to borrow beforehand). Returns the slot the
    /// value lives in and whether it was newly inserted; `false` means
    /// `eq` already matched an existing element, which is left untouched.
    /// `hash_of` recomputes a hash for every live element during a growth
    /// rehash and is never called otherwise.
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
        let (long_hash, short_hash) = H::split(hash);
        let adjusted = G::adjust_short_hash(short_hash);
        let initial_group = S::position_for(long_hash, self.group_count);
        let mut prober = P::new(initial_group, self.group_count);
        let mut first_available: Option<usize> = None;
        loop {
            let group_index = prober.current();
            let group = self.load_group(group_index);
            for offset in group.match_byte(adjusted) {
                let slot_index = self.slot_index(group_index, offset);
                let candidate = unsafe { self.slots[slot_index].assume_init_ref() };
                if likely(eq(candidate)) {
                    return Ok((slot_index, false));
                }
            }
            if first_available.is_none() {
                if let Some(offset) = group.match_empty_or_deleted().lowest_set_bit() {
                    first_available = Some(self.slot_index(group_index, offset));
                }
            }
            if unlikely(self.should_stop_probe(group_index, group, short_hash)) {
                break;
            }
            self.mark_group_overflowed(group_index, short_hash);
            prober.advance();
        }
        let slot_index = match first_available {
            Some(idx) => idx,
            None => {
                // Every group was overflowed and none had room: the load
                // factor bound (P5) should make this unreachable, but grow
                // once more defensively rather than panic.
                self.grow(&hash_of)?;
                return self.insert(hash, eq, make_value, hash_of);
            }
        };
        let group_index = slot_index / G::WIDTH;
        let offset = slot_index % G::WIDTH;
        self.set_ctrl_byte(group_index, offset, adjusted);
        self.slots[slot_index] = MaybeUninit::new(make_value());
        self.len += 1;
        Ok((slot_index, true))
    }

    pub fn remove(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        let slot_index = self.find(hash, &mut eq)?;
        let group_index = slot_index / G::WIDTH;
        let offset = slot_index % G::WIDTH;
        let group = self.load_group(group_index);
        // Reverting to EMPTY when the group still has room shortens future
        // probe sequences; the overflow indicator itself is never cleared
        // here, only by rehash.
        let new_byte = if group.match_empty().any_bit_set() {
            G::EMPTY_BYTE
        } else {
            G::DELETED_BYTE
        };
        self.set_ctrl_byte(group_index, offset, new_byte);
        self.len -= 1;
        let value = unsafe { self.slots[slot_index].assume_init_read() };
        self.slots[slot_index] = MaybeUninit::uninit();
        Some(value)
    }

    #[inline]
    fn needs_growth(&self) -> bool {
        self.group_count == 0 || (self.len + 1) as f32 > self.capacity() as f32 * MAX_LOAD_FACTOR
    }

    fn grow(&mut self, hash_of: &impl Fn(&T) -> u64) -> Result<()> {
        let new_group_count = if self.group_count == 0 {
            S::size_for(1, G::WIDTH, MAX_LOAD_FACTOR)
        } else {
            S::next_size(self.group_count)
        };
        self.rehash_to(new_group_count, hash_of)
    }

    /// Rebuilds the table at `new_group_count`, the only operation allowed
    /// to clear overflow indicators: erase never clears them, only a
    /// rehash does.
    fn rehash_to(&mut self, new_group_count: usize, hash_of: impl Fn(&T) -> u64) -> Result<()> {
        if new_group_count < self.group_count {
            return Err(RcHashError::CapacityOverflow);
        }
        log::debug!(
            "rc table rehash: {} -> {} groups ({} live elements)",
            self.group_count,
            new_group_count,
            self.len
        );
        let ctrl_len = new_group_count
            .checked_mul(CONTROL_BYTES_PER_GROUP)
            .ok_or(RcHashError::CapacityOverflow)?;
        let mut new_ctrl = vec![G::EMPTY_BYTE; ctrl_len];
        if new_group_count > 0 {
            // The table's one sentinel slot is the true last slot of the
            // last group (P5/§3: capacity = group_count * WIDTH - 1, never
            // a separate padding group), so it never needs to be
            // subtracted from anywhere but `capacity()` itself.
            let sentinel_group = new_group_count - 1;
            let sentinel_offset = G::WIDTH - 1;
            new_ctrl[sentinel_group * CONTROL_BYTES_PER_GROUP + sentinel_offset] = SENTINEL;
        }
        let new_slot_count = new_group_count * G::WIDTH;
        let mut new_slots: Vec<MaybeUninit<T>> = Vec::with_capacity(new_slot_count);
        for _ in 0..new_slot_count {
            new_slots.push(MaybeUninit::uninit());
        }

        let old_group_count = self.group_count;
        let old_ctrl = std::mem::replace(&mut self.ctrl, new_ctrl);
        let old_slots = std::mem::replace(&mut self.slots, new_slots);
        self.group_count = new_group_count;
        self.overflow = new_overflow_tracker(new_group_count, self.classed_overflow);

        let mut moved = 0usize;
        for group_index in 0..old_group_count {
            for offset in 0..G::WIDTH {
                let byte = old_ctrl[group_index * CONTROL_BYTES_PER_GROUP + offset];
                if G::is_full_byte(byte) {
                    let old_index = group_index * G::WIDTH + offset;
                    let value = unsafe {
                        std::ptr::read(old_slots[old_index].as_ptr())
                    };
                    let hash = hash_of(&value);
                    self.insert_during_rehash(hash, value);
                    moved += 1;
                }
            }
        }
        self.len = moved;
        Ok(())
    }

    /// Places an element that is known not to already be present, used
    /// only while rebuilding from a prior table during rehash.
    fn insert_during_rehash(&mut self, hash: u64, value: T) {
        let (long_hash, short_hash) = H::split(hash);
        let adjusted = G::adjust_short_hash(short_hash);
        let initial_group = S::position_for(long_hash, self.group_count);
        let mut prober = P::new(initial_group, self.group_count);
        loop {
            let group_index = prober.current();
            let group = self.load_group(group_index);
            if let Some(offset) = group.match_empty_or_deleted().lowest_set_bit() {
                let slot_index = self.slot_index(group_index, offset);
                self.set_ctrl_byte(group_index, offset, adjusted);
                self.slots[slot_index] = MaybeUninit::new(value);
                return;
            }
            self.mark_group_overflowed(group_index, short_hash);
            prober.advance();
        }
    }

    pub fn clear(&mut self) {
        for group_index in 0..self.group_count {
            for offset in 0..G::WIDTH {
                let byte = self.ctrl_byte(group_index, offset);
                if G::is_full_byte(byte) {
                    let idx = self.slot_index(group_index, offset);
                    unsafe { std::ptr::drop_in_place(self.slots[idx].as_mut_ptr()) };
                }
                self.set_ctrl_byte(group_index, offset, G::EMPTY_BYTE);
            }
        }
        if self.group_count > 0 {
            // The reset loop above blindly overwrites every control byte,
            // including the sentinel's; put it back.
            self.set_ctrl_byte(self.group_count - 1, G::WIDTH - 1, SENTINEL);
        }
        self.overflow.clear_all();
        self.len = 0;
    }

    pub fn iter(&self) -> RcIter<'_, T, G> {
        RcIter {
            ctrl: &self.ctrl,
            slots: &self.slots,
            next_index: 0,
            capacity: self.capacity(),
            remaining: self.len,
            _group: std::marker::PhantomData,
        }
    }
}

impl<T, G, H, S, P> Drop for RawRcTable<T, G, H, S, P>
where
    G: GroupOps,
    H: HashSplit,
    S: SizingPolicy,
    P: Prober,
{
    fn drop(&mut self) {
        for group_index in 0..self.group_count {
            for offset in 0..G::WIDTH {
                let byte = self.ctrl_byte(group_index, offset);
                if G::is_full_byte(byte) {
                    let idx = self.slot_index(group_index, offset);
                    unsafe { std::ptr::drop_in_place(self.slots[idx].as_mut_ptr()) };
                }
            }
        }
    }
}

fn new_overflow_tracker(group_count: usize, classed: bool) -> Box<dyn OverflowTracker> {
    if classed {
        Box::new(ClassBitmapOverflow::new(group_count))
    } else {
        Box::new(SingleFlagOverflow::new(group_count))
    }
}

/// Forward iterator over every live element, grounded in the source's
/// forward-walking iterator but expressed against an explicit capacity
/// bound instead of a sentinel-terminated pointer walk.
pub struct RcIter<'a, T, G> {
    ctrl: &'a [u8],
    slots: &'a [MaybeUninit<T>],
    next_index: usize,
    capacity: usize,
    remaining: usize,
    _group: std::marker::PhantomData<G>,
}

impl<'a, T, G: GroupOps> Iterator for RcIter<'a, T, G> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while self.next_index < self.capacity {
            let group_index = self.next_index / G::WIDTH;
            let offset = self.next_index % G::WIDTH;
            let byte = self.ctrl[group_index * CONTROL_BYTES_PER_GROUP + offset];
            let idx = self.next_index;
            self.next_index += 1;
            if G::is_full_byte(byte) {
                self.remaining -= 1;
                return Some(unsafe { self.slots[idx].assume_init_ref() });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
