//! Slot: a position in a `DenseMap` bucket array, stamped with the layout
//! epoch it was taken from.
//!
//! Growth, rehash, clear, and reuse of a tombstone all bump the table's
//! epoch, so a slot taken before any of them stops resolving instead of
//! pointing at a moved or reused bucket. Erasing leaves other slots valid.

use crate::dense_map::DenseMap;
use crate::key_policy::KeyPolicy;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot {
    index: usize,
    epoch: u64,
}

impl Slot {
    pub(crate) fn new(index: usize, epoch: u64) -> Self {
        Slot { index, epoch }
    }

    /// Physical bucket index this slot was taken at.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn key<'a, K, V, P>(&self, map: &'a DenseMap<K, V, P>) -> Option<&'a K>
    where
        P: KeyPolicy<K>,
    {
        map.slot_entry(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, P>(&self, map: &'a DenseMap<K, V, P>) -> Option<&'a V>
    where
        P: KeyPolicy<K>,
    {
        map.slot_entry(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, P>(&self, map: &'a mut DenseMap<K, V, P>) -> Option<&'a mut V>
    where
        P: KeyPolicy<K>,
    {
        map.slot_value_mut(*self)
    }
}
