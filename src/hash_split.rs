//! Splits one 64-bit hash into the two values every probe needs: a long
//! hash that a [`crate::sizing::SizingPolicy`] turns into a group index,
//! and a short hash (7 bits) stored in a control byte as a fingerprint.
//! Grounded in the source's `shift_hash`/`rshift_hash`/`shift_mod_hash`
//! family, which all agree that the short hash comes from the *bottom*
//! bits of the hash and the long hash from everything else.

/// Splits a 64-bit hash into `(long_hash, short_hash)`. `short_hash` is
/// always in `0..=0x7F`; how it and the long hash are derived from the
/// raw hash is the policy.
pub trait HashSplit {
    fn split(hash: u64) -> (u64, u8);
}

/// Long hash is the top bits after discarding the bottom 7 used for the
/// short hash (`hash >> 7`); short hash is the bottom 7 bits directly.
/// The simplest and cheapest split, suitable when the hasher already
/// mixes bits well across the whole word.
pub struct ShiftHashSplit;

impl HashSplit for ShiftHashSplit {
    #[inline]
    fn split(hash: u64) -> (u64, u8) {
        let short = (hash & 0x7F) as u8;
        let long = hash >> 7;
        (long, short)
    }
}

/// Mirror image of [`ShiftHashSplit`]: short hash comes from the top 7
/// bits, long hash from the rest. Useful when a hasher's low bits are the
/// weaker ones (e.g. counter-like keys under a weak multiplicative mix).
pub struct ReverseShiftHashSplit;

impl HashSplit for ReverseShiftHashSplit {
    #[inline]
    fn split(hash: u64) -> (u64, u8) {
        let short = ((hash >> 57) & 0x7F) as u8;
        let long = hash & (u64::MAX >> 7);
        (long, short)
    }
}

/// Derives the short hash from `hash` modulo a small prime, keeping the
/// full hash as the long hash so a [`crate::sizing::PrimeSizing`] table
/// still sees maximal entropy for bucket placement. Named after the
/// source's `shift_mod_hash<N, Mod>`.
pub struct ModHashSplit<const MOD: u64>;

impl<const MOD: u64> HashSplit for ModHashSplit<MOD> {
    #[inline]
    fn split(hash: u64) -> (u64, u8) {
        let short = (hash % MOD) as u8 & 0x7F;
        (hash, short)
    }
}

/// Runs a second avalanche mix (splitmix64's finalizer) before splitting,
/// for hashers whose output does not already mix well across both ends
/// of the word. Named `xm_hash` in the source.
pub struct AvalancheHashSplit;

impl HashSplit for AvalancheHashSplit {
    #[inline]
    fn split(hash: u64) -> (u64, u8) {
        let mixed = avalanche(hash);
        let short = (mixed & 0x7F) as u8;
        let long = mixed >> 7;
        (long, short)
    }
}

#[inline]
fn avalanche(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}
