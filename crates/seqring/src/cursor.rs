use crate::invariants::{debug_assert_index_in_bounds, debug_assert_lap_boundary};
use crate::Config;

/// A consumer's private read position.
///
/// `read_index` is the next slot to read and `wrap_count` the number of full
/// laps already completed. Slot versions alone cannot tell "not yet written"
/// from "written N laps ago"; the pair can: on lap `k` a fully published slot
/// carries version `2 * (k + 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    read_index: usize,
    wrap_count: u64,
}

impl Cursor {
    /// A cursor at the start of the ring, before any lap.
    pub const fn new() -> Self {
        Self {
            read_index: 0,
            wrap_count: 0,
        }
    }

    /// A cursor pointing at the absolute `position` of a ring.
    pub(crate) fn at_position(position: u64, config: &Config) -> Self {
        Self {
            read_index: config.index_of(position),
            wrap_count: config.lap_of(position),
        }
    }

    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    #[inline]
    pub fn wrap_count(&self) -> u64 {
        self.wrap_count
    }

    /// The version a fully published slot carries on this cursor's lap.
    #[inline]
    pub fn expected_version(&self) -> u64 {
        self.wrap_count.wrapping_add(1).wrapping_mul(2)
    }

    /// Absolute number of values this cursor has moved past.
    #[inline]
    pub fn position(&self, config: &Config) -> u64 {
        (self.wrap_count << config.shift()) | self.read_index as u64
    }

    /// Step to the next slot, counting a lap when the index wraps to 0.
    #[inline]
    pub(crate) fn advance(&mut self, config: &Config) {
        let next = (self.read_index + 1) & config.mask();
        debug_assert_index_in_bounds!(next, config.capacity());
        if next <= self.read_index {
            debug_assert_lap_boundary!(self.read_index, next, config.capacity());
            self.wrap_count = self.wrap_count.wrapping_add(1);
        }
        self.read_index = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_laps_at_boundary() {
        let config = Config::new(4).unwrap();
        let mut cursor = Cursor::new();

        for _ in 0..3 {
            cursor.advance(&config);
            assert_eq!(cursor.wrap_count(), 0);
        }
        assert_eq!(cursor.read_index(), 3);

        cursor.advance(&config);
        assert_eq!(cursor.read_index(), 0);
        assert_eq!(cursor.wrap_count(), 1);
        assert_eq!(cursor.position(&config), 4);
    }

    #[test]
    fn test_expected_version_per_lap() {
        let config = Config::new(2).unwrap();
        let mut cursor = Cursor::new();
        assert_eq!(cursor.expected_version(), 2);

        cursor.advance(&config);
        cursor.advance(&config);
        assert_eq!(cursor.expected_version(), 4);
    }

    #[test]
    fn test_single_slot_ring_laps_every_step() {
        let config = Config::new(1).unwrap();
        let mut cursor = Cursor::new();
        cursor.advance(&config);
        cursor.advance(&config);
        assert_eq!(cursor.read_index(), 0);
        assert_eq!(cursor.wrap_count(), 2);
    }

    #[test]
    fn test_position_round_trips() {
        let config = Config::new(8).unwrap();
        let cursor = Cursor::at_position(29, &config);
        assert_eq!(cursor.read_index(), 5);
        assert_eq!(cursor.wrap_count(), 3);
        assert_eq!(cursor.position(&config), 29);
    }
}
