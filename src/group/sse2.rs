//! SSE2 group implementations: `pcmpeqb` + `pmovmskb` over a 16-byte
//! control vector, one instruction pair per comparison. Available on every
//! baseline x86/x86_64 target, so no runtime feature detection is needed.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{DELETED, EMPTY, SENTINEL};

#[derive(Copy, Clone)]
pub struct Group16Sse2(__m128i);

impl Group16Sse2 {
    pub const WIDTH: usize = 16;

    /// # Safety
    /// `ptr` must point to 16 readable control bytes.
    #[inline]
    pub unsafe fn load(ptr: *const u8) -> Self {
        Group16Sse2(_mm_loadu_si128(ptr as *const __m128i))
    }

    #[inline]
    pub fn match_byte(self, b: u8) -> u32 {
        unsafe {
            let cmp = _mm_set1_epi8(b as i8);
            _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, cmp)) as u32
        }
    }

    #[inline]
    pub fn match_empty(self) -> u32 {
        self.match_byte(EMPTY)
    }

    #[inline]
    pub fn match_empty_or_deleted(self) -> u32 {
        self.match_byte(EMPTY) | self.match_byte(DELETED)
    }

    #[inline]
    pub fn match_full(self) -> u32 {
        !(self.match_empty_or_deleted() | self.match_sentinel()) & 0xFFFF
    }

    #[inline]
    pub fn match_sentinel(self) -> u32 {
        self.match_byte(SENTINEL)
    }
}

/// 15-slot group: the 16th SSE2 lane is loaded but its match bit is
/// always masked off, exactly like the generic fallback.
#[derive(Copy, Clone)]
pub struct Group15Sse2(__m128i);

impl Group15Sse2 {
    pub const WIDTH: usize = 15;

    /// # Safety
    /// `ptr` must point to at least 16 readable control bytes.
    #[inline]
    pub unsafe fn load(ptr: *const u8) -> Self {
        Group15Sse2(_mm_loadu_si128(ptr as *const __m128i))
    }

    #[inline]
    fn mask15(raw: u32) -> u32 {
        raw & 0x7FFF
    }

    #[inline]
    pub fn match_byte(self, adjusted: u8) -> u32 {
        unsafe {
            let cmp = _mm_set1_epi8(adjusted as i8);
            Self::mask15(_mm_movemask_epi8(_mm_cmpeq_epi8(self.0, cmp)) as u32)
        }
    }

    #[inline]
    pub fn match_empty(self) -> u32 {
        self.match_byte(super::EMPTY_15)
    }

    /// No distinct deleted byte at N=15 (see [`super::EMPTY_15`]), so this
    /// coincides with [`Self::match_empty`].
    #[inline]
    pub fn match_empty_or_deleted(self) -> u32 {
        self.match_empty()
    }

    #[inline]
    pub fn match_sentinel(self) -> u32 {
        self.match_byte(super::SENTINEL)
    }

    #[inline]
    pub fn match_full(self) -> u32 {
        Self::mask15(!(self.match_empty_or_deleted() | self.match_sentinel()))
    }
}
