//! Turns a long hash and a requested capacity into a concrete group
//! count, and a long hash into a starting group index. Each policy is a
//! self-consistent pair of `(size_for, position_for)`: the container
//! never mixes a size rule from one policy with a position rule from
//! another. Grounded in the source's `prime_size`/`prime_fmod_size`/
//! `pow2_size`/`pow2_fib_size`/`prime_frng_size` family.

/// A table's group-count growth and index-mapping rule.
pub trait SizingPolicy {
    /// Smallest valid group count that can hold `capacity` elements at
    /// the configured load factor.
    fn size_for(capacity: usize, group_width: usize, max_load_factor: f32) -> usize;

    /// Maps a long hash into `0..group_count`.
    fn position_for(long_hash: u64, group_count: usize) -> usize;

    /// Smallest valid group count, used when growing with no particular
    /// capacity target (e.g. doubling on overflow).
    fn next_size(current_group_count: usize) -> usize;
}

const PRIMES: &[u64] = &[
    1, 3, 5, 7, 11, 13, 17, 23, 29, 37, 47, 59, 73, 97, 127, 151, 197, 251, 313, 397, 499, 631,
    797, 1009, 1259, 1597, 2011, 2539, 3203, 4027, 5087, 6421, 8089, 10193, 12853, 16193, 20399,
    25717, 32401, 40823, 51437, 64811, 81649, 102877, 129607, 163307, 205759, 259229, 326617,
    411527, 518509, 653267, 823117, 1037059, 1306601, 1646237, 2074129, 2613229, 3292489,
    4148279, 5226491, 6584983, 8296553, 10453007, 13169977, 16593127, 20906033, 26339969,
    33186281, 41812097, 52679969, 66372617, 83624237, 105359939, 132745199, 167248483,
    210719881, 265490441, 334496971, 421439783, 530980861, 668993977, 842879579, 1061961721,
    1337987929, 1685759167, 2123923447,
];

/// Group count is always prime, chosen from a fixed table; position is a
/// plain modulo. Matches the source's `prime_size`.
pub struct PrimeSizing;

impl SizingPolicy for PrimeSizing {
    fn size_for(capacity: usize, group_width: usize, max_load_factor: f32) -> usize {
        let needed_slots = ((capacity as f32) / max_load_factor).ceil() as u64;
        let needed_groups = (needed_slots + group_width as u64 - 1) / group_width as u64;
        for &p in PRIMES {
            if p >= needed_groups.max(1) {
                return p as usize;
            }
        }
        *PRIMES.last().unwrap() as usize
    }

    #[inline]
    fn position_for(long_hash: u64, group_count: usize) -> usize {
        (long_hash % group_count as u64) as usize
    }

    fn next_size(current_group_count: usize) -> usize {
        for &p in PRIMES {
            if p as usize > current_group_count {
                return p as usize;
            }
        }
        *PRIMES.last().unwrap() as usize
    }
}

/// Group count is always a power of two; position is `long_hash & (n -
/// 1)`. Matches the source's `pow2_size`.
pub struct PowerOfTwoSizing;

impl SizingPolicy for PowerOfTwoSizing {
    fn size_for(capacity: usize, group_width: usize, max_load_factor: f32) -> usize {
        let needed_slots = ((capacity as f32) / max_load_factor).ceil() as u64;
        let needed_groups = ((needed_slots + group_width as u64 - 1) / group_width as u64).max(1);
        needed_groups.next_power_of_two() as usize
    }

    #[inline]
    fn position_for(long_hash: u64, group_count: usize) -> usize {
        debug_assert!(group_count.is_power_of_two());
        (long_hash as usize) & (group_count - 1)
    }

    fn next_size(current_group_count: usize) -> usize {
        (current_group_count.max(1) * 2).next_power_of_two()
    }
}

/// Power-of-two group count, but position comes from a Fibonacci-hashing
/// multiply-and-shift instead of a raw mask, spreading weak low bits of a
/// poor hash across the whole index range. Matches `pow2_fib_size`.
pub struct FibonacciPow2Sizing;

const FIB64: u64 = 0x9E3779B97F4A7C15;

impl SizingPolicy for FibonacciPow2Sizing {
    fn size_for(capacity: usize, group_width: usize, max_load_factor: f32) -> usize {
        PowerOfTwoSizing::size_for(capacity, group_width, max_load_factor)
    }

    #[inline]
    fn position_for(long_hash: u64, group_count: usize) -> usize {
        debug_assert!(group_count.is_power_of_two());
        if group_count <= 1 {
            return 0;
        }
        let shift = 64 - group_count.trailing_zeros();
        ((long_hash.wrapping_mul(FIB64)) >> shift) as usize
    }

    fn next_size(current_group_count: usize) -> usize {
        PowerOfTwoSizing::next_size(current_group_count)
    }
}

/// Arbitrary group count (no power-of-two or primality constraint);
/// position via Lemire's "fastrange" multiply-high trick, giving a
/// uniform mapping onto `0..group_count` for any `group_count`. Matches
/// the source's `prime_frng_size` family's non-prime variant used when
/// exact growth factors matter more than modulo-by-prime quality.
pub struct FastrangeSizing;

impl SizingPolicy for FastrangeSizing {
    fn size_for(capacity: usize, group_width: usize, max_load_factor: f32) -> usize {
        let needed_slots = ((capacity as f32) / max_load_factor).ceil() as u64;
        ((needed_slots + group_width as u64 - 1) / group_width as u64).max(1) as usize
    }

    #[inline]
    fn position_for(long_hash: u64, group_count: usize) -> usize {
        (((long_hash as u128) * (group_count as u128)) >> 64) as usize
    }

    fn next_size(current_group_count: usize) -> usize {
        (current_group_count.max(1) * 2).max(current_group_count + 1)
    }
}
