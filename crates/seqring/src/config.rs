use crate::ConfigError;

/// Largest supported ring: 2^30 slots (16 GiB of slot storage).
pub const MAX_CAPACITY_BITS: u32 = 30;

/// Validated ring configuration.
///
/// The capacity, its index mask and its log2 are computed once here and never
/// recomputed on the hot path. A `Config` can only be obtained through a
/// validating constructor, so holding one proves the capacity is a non-zero
/// power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    capacity: usize,
    mask: usize,
    shift: u32,
}

impl Config {
    /// Creates a configuration for a ring of `capacity` slots.
    ///
    /// Fails if `capacity` is zero, not a power of two, or larger than
    /// `2^MAX_CAPACITY_BITS`.
    pub const fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !capacity.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { capacity });
        }
        if capacity > 1 << MAX_CAPACITY_BITS {
            return Err(ConfigError::TooLarge {
                capacity,
                max: 1 << MAX_CAPACITY_BITS,
            });
        }
        Ok(Self::with_shift(capacity.trailing_zeros()))
    }

    /// Creates a configuration for a ring of `2^bits` slots.
    pub const fn from_bits(bits: u32) -> Result<Self, ConfigError> {
        if bits > MAX_CAPACITY_BITS {
            let capacity = match 1usize.checked_shl(bits) {
                Some(capacity) => capacity,
                None => usize::MAX,
            };
            return Err(ConfigError::TooLarge {
                capacity,
                max: 1 << MAX_CAPACITY_BITS,
            });
        }
        Ok(Self::with_shift(bits))
    }

    /// Caller guarantees `shift <= MAX_CAPACITY_BITS`.
    const fn with_shift(shift: u32) -> Self {
        let capacity = 1 << shift;
        Self {
            capacity,
            mask: capacity - 1,
            shift,
        }
    }

    /// Returns the number of slots in the ring.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.mask
    }

    /// Returns `log2(capacity)`.
    #[inline]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Maps a monotonic position onto its slot index.
    #[inline]
    pub const fn index_of(&self, position: u64) -> usize {
        (position as usize) & self.mask
    }

    /// Returns how many full laps precede `position`.
    #[inline]
    pub const fn lap_of(&self, position: u64) -> u64 {
        position >> self.shift
    }

    /// 1K slots (16 KiB of slots, fits in L1 on most cores).
    pub const fn low_latency() -> Self {
        LOW_LATENCY_CONFIG
    }

    /// 64K slots, for consumers that may stall for longer periods.
    pub const fn high_throughput() -> Self {
        HIGH_THROUGHPUT_CONFIG
    }
}

impl Default for Config {
    /// 64 slots.
    fn default() -> Self {
        Self::with_shift(6)
    }
}

/// Low latency configuration (1K slots)
pub const LOW_LATENCY_CONFIG: Config = Config::with_shift(10);

/// High throughput configuration (64K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::with_shift(16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero() {
        assert_eq!(Config::new(0), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        for capacity in [3, 6, 7, 12, 100, 1023] {
            assert_eq!(
                Config::new(capacity),
                Err(ConfigError::NotPowerOfTwo { capacity })
            );
        }
    }

    #[test]
    fn test_rejects_too_large() {
        let capacity = 1usize << (MAX_CAPACITY_BITS + 1);
        let err = Config::new(capacity).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { .. }));
        assert_eq!(err.capacity(), capacity);
        assert!(Config::from_bits(MAX_CAPACITY_BITS + 1).is_err());
    }

    #[test]
    fn test_derived_fields() {
        let config = Config::new(8).unwrap();
        assert_eq!(config.capacity(), 8);
        assert_eq!(config.mask(), 7);
        assert_eq!(config.shift(), 3);
        assert_eq!(config, Config::from_bits(3).unwrap());

        assert_eq!(config.index_of(13), 5);
        assert_eq!(config.lap_of(13), 1);
        assert_eq!(config.lap_of(7), 0);
    }

    #[test]
    fn test_single_slot_ring_is_valid() {
        let config = Config::new(1).unwrap();
        assert_eq!(config.mask(), 0);
        assert_eq!(config.index_of(5), 0);
        assert_eq!(config.lap_of(5), 5);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Config::default().capacity(), 64);
        assert_eq!(Config::low_latency().capacity(), 1024);
        assert_eq!(Config::high_throughput().capacity(), 65536);
    }
}
