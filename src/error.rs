use thiserror::Error;

/// Errors the core can raise. The container otherwise never fails silently
/// and never retries: every error surfaces immediately to the caller.
#[derive(Error, Debug)]
pub enum RcHashError {
    /// The computed capacity would exceed the collection's maximum
    /// (in practice `isize::MAX` bytes once multiplied by the element size).
    #[error("hash table capacity overflow")]
    CapacityOverflow,
    /// Hopscotch/long-hop insertion could not find any earlier element in
    /// the neighbourhood to hop forward, and a mandatory rehash did not
    /// create enough room either.
    #[error("hopscotch displacement exhausted before an empty slot was reached")]
    DisplacementExhausted,
}

pub type Result<T> = core::result::Result<T, RcHashError>;
