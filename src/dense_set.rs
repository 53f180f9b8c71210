//! DenseSet: a `DenseMap` with unit values.

use crate::dense_map::{self, DenseMap};
use crate::key_policy::{DefaultKeyPolicy, KeyPolicy};
use crate::slot::Slot;
use core::fmt;
use core::iter::FusedIterator;

pub struct DenseSet<K, P = DefaultKeyPolicy> {
    map: DenseMap<K, (), P>,
}

impl<K, P> DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    pub fn new() -> Self {
        Self {
            map: DenseMap::new(),
        }
    }

    pub fn with_buckets(num_buckets: usize) -> Self {
        Self {
            map: DenseMap::with_buckets(num_buckets),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    pub fn num_buckets(&self) -> usize {
        self.map.num_buckets()
    }

    /// Adds `key`; the flag is false when it was already present.
    pub fn insert(&mut self, key: K) -> (Slot, bool) {
        self.map.insert(key, ())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn count(&self, key: &K) -> usize {
        self.map.count(key)
    }

    /// The stored element equal to `key`.
    pub fn get(&self, key: &K) -> Option<&K> {
        self.map.find(key).map(|(k, _)| k)
    }

    pub fn find_slot(&self, key: &K) -> Option<Slot> {
        self.map.find_slot(key)
    }

    /// Element at `slot`, if the slot is still current.
    pub fn slot_key(&self, slot: Slot) -> Option<&K> {
        slot.key(&self.map)
    }

    pub fn erase(&mut self, key: &K) -> bool {
        self.map.erase(key)
    }

    pub fn take(&mut self, key: &K) -> Option<K> {
        self.map.remove_entry(key).map(|(k, _)| k)
    }

    pub fn erase_slot(&mut self, slot: Slot) -> Option<K> {
        self.map.erase_slot(slot).map(|(k, _)| k)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.map.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn reserve(&mut self, entries: usize) {
        self.map.reserve(entries);
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.map.swap(&mut other.map);
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.map.iter(),
        }
    }
}

impl<K, P> Default for DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, P> Clone for DenseSet<K, P> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K: fmt::Debug, P> fmt::Debug for DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, P> Extend<K> for DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, P> FromIterator<K> for DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::new();
        set.reserve(iter.size_hint().0);
        set.extend(iter);
        set
    }
}

pub struct Iter<'a, K> {
    inner: dense_map::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

pub struct IntoIter<K> {
    inner: dense_map::IntoIter<K, ()>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, P> IntoIterator for DenseSet<K, P> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, K, P> IntoIterator for &'a DenseSet<K, P>
where
    P: KeyPolicy<K>,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
