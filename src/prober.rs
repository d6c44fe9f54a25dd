//! Generates the sequence of group indices an insert/find/erase walks
//! after its initial position, one probe at a time. Grounded in the
//! source's `pow2_prober`/`nonpow2_prober`.

/// A probe sequence bound to one table size. `next` is called until the
/// caller finds what it needs; the sequence never repeats a group before
/// covering the whole table (P2: probe termination).
pub trait Prober {
    fn new(initial_group: usize, group_count: usize) -> Self;
    fn current(&self) -> usize;
    fn advance(&mut self);
}

/// Triangular-number probing over a power-of-two group count: offsets
/// `0, 1, 3, 6, 10, ...` masked into range, guaranteed to visit every
/// group exactly once before repeating (the standard open-addressing
/// triangular sequence over a power-of-two modulus).
pub struct Pow2Prober {
    mask: usize,
    current: usize,
    stride: usize,
}

impl Prober for Pow2Prober {
    #[inline]
    fn new(initial_group: usize, group_count: usize) -> Self {
        debug_assert!(group_count.is_power_of_two());
        Pow2Prober {
            mask: group_count - 1,
            current: initial_group & (group_count - 1),
            stride: 0,
        }
    }

    #[inline]
    fn current(&self) -> usize {
        self.current
    }

    #[inline]
    fn advance(&mut self) {
        self.stride += 1;
        self.current = (self.current + self.stride) & self.mask;
    }
}

/// The same triangular-number stepping as [`Pow2Prober`], wrapped to an
/// arbitrary (e.g. prime) group count instead of a power-of-two one: steps
/// are taken modulo the next power of two at or above `group_count`, and
/// any step landing at or past `group_count` is rejected and immediately
/// recomputed with the next stride, rather than folded back into range.
/// Matches the source's `nonpow2_prober::next`.
pub struct NonPow2Prober {
    group_count: usize,
    mask: usize,
    current: usize,
    step: usize,
}

impl Prober for NonPow2Prober {
    #[inline]
    fn new(initial_group: usize, group_count: usize) -> Self {
        NonPow2Prober {
            group_count,
            mask: group_count.max(1).next_power_of_two() - 1,
            current: initial_group % group_count.max(1),
            step: 0,
        }
    }

    #[inline]
    fn current(&self) -> usize {
        self.current
    }

    #[inline]
    fn advance(&mut self) {
        loop {
            self.step += 1;
            self.current = (self.current + self.step) & self.mask;
            if self.current < self.group_count {
                break;
            }
        }
    }
}
