#![cfg_attr(feature = "nightly", feature(core_intrinsics))]

//! In-memory, single-threaded open-addressing hash table cores used for
//! studying probe and displacement strategies: a SIMD-group
//! "reduced-collision" (RC) engine as the primary implementation, plus
//! coalesced and hopscotch siblings built the same way.
//!
//! None of the three engines are safe for concurrent access (`Send`,
//! not `Sync`): every mutating operation assumes exclusive `&mut self`
//! access.

pub mod coalesced;
pub mod error;
pub mod group;
pub mod hash_split;
pub mod hopscotch;
pub mod prober;
pub mod rc;
pub mod sizing;

mod hint;

pub use coalesced::map::CoalescedMap;
pub use coalesced::NodeFlavor;
pub use error::{RcHashError, Result};
pub use hopscotch::map::HopscotchMap;
pub use hopscotch::{Hopscotch, LongHop};
pub use rc::map::RcHashMap;

/// The one behavioural choice left open by design: whether a table built
/// over `group::Group15` tracks per-group overflow with a single flag or
/// an 8-bit classed bitmap. Exposed at runtime rather than as a type
/// parameter since it is a memory/probe-length trade-off, not a change
/// in the table's shape. `Group16` tables ignore this entirely — their
/// overflow indicator is derived from group occupancy, never stored.
#[derive(Copy, Clone, Debug, Default)]
pub struct TableConfig {
    pub classed_overflow: bool,
}
