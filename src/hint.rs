//! Branch-prediction hints used on the hot lookup/insert paths.
//!
//! A real `likely`/`unlikely` on `nightly`, a transparent pass-through
//! otherwise.

#[cfg(feature = "nightly")]
#[inline]
pub fn likely(b: bool) -> bool {
    core::intrinsics::likely(b)
}

#[cfg(not(feature = "nightly"))]
#[inline]
pub fn likely(b: bool) -> bool {
    b
}

#[cfg(feature = "nightly")]
#[inline]
pub fn unlikely(b: bool) -> bool {
    core::intrinsics::unlikely(b)
}

#[cfg(not(feature = "nightly"))]
#[inline]
pub fn unlikely(b: bool) -> bool {
    b
}
