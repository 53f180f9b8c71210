//! Growth policy shared by `DenseMap` and `StringMap`.
//!
//! Both tables check the prospective entry count before placing a new
//! entry: past 3/4 load they double, and when live entries plus tombstones
//! leave no more than 1/8 of the buckets empty they rehash in place to
//! drop tombstones.

/// Smallest bucket array a growth ever allocates.
pub const MIN_BUCKETS: usize = 64;

/// What an insert has to do to the table before writing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Growth {
    /// Write into the probed bucket.
    None,
    /// Reallocate with at least this many buckets.
    Grow(usize),
    /// Reallocate at the current size to clear tombstones.
    Rehash,
}

/// Decides the growth step for inserting one more entry.
#[inline]
pub fn on_insert(occupied: usize, tombstoned: usize, num_buckets: usize) -> Growth {
    let new_occupied = occupied + 1;
    if new_occupied * 4 >= num_buckets * 3 {
        Growth::Grow(num_buckets * 2)
    } else if num_buckets.saturating_sub(new_occupied + tombstoned) <= num_buckets / 8 {
        Growth::Rehash
    } else {
        Growth::None
    }
}

/// Bucket count allocated by a growth asked for at least `at_least`.
#[inline]
pub fn grown_size(at_least: usize) -> usize {
    MIN_BUCKETS.max(at_least.next_power_of_two())
}

/// Bucket count that holds `entries` without triggering growth.
#[inline]
pub fn buckets_for_entries(entries: usize) -> usize {
    if entries == 0 {
        return 0;
    }
    (entries * 4 / 3 + 1).next_power_of_two()
}

/// Bucket count to reinitialize at when clearing a table that held
/// `old_len` entries.
#[inline]
pub fn shrink_target(old_len: usize) -> usize {
    if old_len == 0 {
        return 0;
    }
    MIN_BUCKETS.max(old_len.next_power_of_two() * 2)
}

/// Whether a clear should release memory instead of resetting in place.
#[inline]
pub fn should_shrink_on_clear(len: usize, num_buckets: usize) -> bool {
    len * 4 < num_buckets && num_buckets > MIN_BUCKETS
}
