//! Error types for ring construction.

use thiserror::Error;

/// Errors raised while validating a ring [`Config`](crate::Config).
///
/// These are the only errors the crate produces: once a ring exists, neither
/// `publish` nor `poll` can fail. An empty poll is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A ring must hold at least one slot.
    #[error("ring capacity must be non-zero")]
    ZeroCapacity,

    /// Capacity is not a power of two, so the index cannot be masked.
    #[error("ring capacity {capacity} is not a power of two")]
    NotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },

    /// Capacity exceeds the largest supported ring.
    #[error("ring capacity {capacity} exceeds the maximum of {max}")]
    TooLarge {
        /// The rejected capacity.
        capacity: usize,
        /// The largest capacity accepted.
        max: usize,
    },
}

impl ConfigError {
    /// Returns the capacity that was rejected.
    #[inline]
    pub fn capacity(&self) -> usize {
        match *self {
            Self::ZeroCapacity => 0,
            Self::NotPowerOfTwo { capacity } | Self::TooLarge { capacity, .. } => capacity,
        }
    }
}
