//! Triangular probe sequence over a power-of-two bucket array.
//!
//! Starting from `h & (n - 1)`, the i-th step advances by `i`. Because `n`
//! is a power of two, the first `n` positions form a permutation of
//! `0..n`; the iterator stops after yielding them so a lookup on a table
//! with no empty bucket terminates.

/// Bucket indices to visit for one hash value.
#[derive(Clone, Debug)]
pub struct ProbeSeq {
    pos: usize,
    stride: usize,
    mask: usize,
    remaining: usize,
}

impl ProbeSeq {
    /// Creates the sequence for `hash` over `num_buckets` buckets.
    ///
    /// `num_buckets` must be zero or a power of two; a zero-sized table
    /// yields nothing.
    #[inline]
    pub fn new(hash: u32, num_buckets: usize) -> Self {
        debug_assert!(
            num_buckets == 0 || num_buckets.is_power_of_two(),
            "bucket count must be a power of two"
        );
        let mask = num_buckets.wrapping_sub(1);
        Self {
            pos: (hash as usize) & mask,
            stride: 0,
            mask,
            remaining: num_buckets,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.pos = (self.pos + self.stride) & self.mask;
        self.stride += 1;
        Some(self.pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
