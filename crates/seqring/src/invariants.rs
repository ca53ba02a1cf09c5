//! Debug assertion macros for ring invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay nothing.

// =============================================================================
// Slot versions
// =============================================================================

/// Assert that a slot version is even once a publish completes.
///
/// **Invariant**: even = stable, odd = write in progress.
///
/// Used in: `RingCore::publish()` after the closing version store
macro_rules! debug_assert_stable_version {
    ($version:expr) => {
        debug_assert!(
            $version & 1 == 0,
            "slot version {} is odd after publish completed",
            $version
        )
    };
}

// =============================================================================
// Cursors
// =============================================================================

/// Assert that a read index addresses a slot inside the ring.
///
/// Used in: `Cursor::advance()`
macro_rules! debug_assert_index_in_bounds {
    ($index:expr, $capacity:expr) => {
        debug_assert!(
            $index < $capacity,
            "read index {} outside ring of {} slots",
            $index,
            $capacity
        )
    };
}

/// Assert that the wrap counter only moves when the index crosses the end of
/// the ring.
///
/// **Invariant**: `wrap_count` increments iff `read_index` goes `capacity - 1 -> 0`.
///
/// Used in: `Cursor::advance()`
macro_rules! debug_assert_lap_boundary {
    ($old_index:expr, $new_index:expr, $capacity:expr) => {
        debug_assert!(
            $new_index == 0 && $old_index == $capacity - 1,
            "wrap counted on {} -> {} in ring of {} slots",
            $old_index,
            $new_index,
            $capacity
        )
    };
}

/// Assert that a position only increases.
///
/// Used in: `RingCore::publish()` for the write cursor, `spsc::Consumer` for
/// the consumed position
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

pub(crate) use debug_assert_index_in_bounds;
pub(crate) use debug_assert_lap_boundary;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_stable_version;
