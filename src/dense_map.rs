//! DenseMap: open-addressing map storing keys and values inline in a
//! power-of-two bucket array.
//!
//! Each bucket is `Empty`, `Tombstone` or `Occupied(K, V)`. Lookups follow
//! the triangular probe sequence from `P::hash_value(key)`, skip
//! tombstones, and stop at the first empty bucket. Inserts reuse the first
//! tombstone on the probe path when there is one.

use crate::error::Error;
use crate::growth::{self, Growth};
use crate::key_policy::{DefaultKeyPolicy, KeyPolicy};
use crate::probe::ProbeSeq;
use crate::slot::Slot;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

#[derive(Clone, Debug)]
enum Bucket<K, V> {
    Empty,
    Tombstone,
    Occupied(K, V),
}

// Result of walking the probe sequence for one key.
enum Probe {
    Found(usize),
    // First tombstone on the path, else the terminating empty bucket.
    Vacant(usize),
    // Every bucket is occupied by another key (or the table has none).
    Full,
}

fn empty_buckets<K, V>(n: usize) -> Box<[Bucket<K, V>]> {
    debug_assert!(n == 0 || n.is_power_of_two());
    core::iter::repeat_with(|| Bucket::Empty).take(n).collect()
}

pub struct DenseMap<K, V, P = DefaultKeyPolicy> {
    buckets: Box<[Bucket<K, V>]>,
    occupied: usize,
    tombstoned: usize,
    epoch: u64,
    _policy: PhantomData<fn() -> P>,
}

impl<K, V, P> DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    /// Creates an empty map; nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    /// Creates a map with `num_buckets` buckets, rounded up to a power of two.
    pub fn with_buckets(num_buckets: usize) -> Self {
        let n = if num_buckets == 0 {
            0
        } else {
            num_buckets.next_power_of_two()
        };
        Self {
            buckets: empty_buckets(n),
            occupied: 0,
            tombstoned: 0,
            epoch: 0,
            _policy: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.occupied
    }
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
    pub fn num_tombstones(&self) -> usize {
        self.tombstoned
    }

    fn lookup(&self, key: &K) -> Probe {
        debug_assert!(
            !P::is_reserved(key),
            "empty/tombstone keys must not be used as map keys"
        );
        if self.buckets.is_empty() {
            return Probe::Full;
        }
        let mut first_tombstone = None;
        for idx in ProbeSeq::new(P::hash_value(key), self.buckets.len()) {
            match &self.buckets[idx] {
                Bucket::Occupied(k, _) => {
                    if P::is_equal(key, k) {
                        return Probe::Found(idx);
                    }
                }
                Bucket::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                Bucket::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
            }
        }
        match first_tombstone {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }

    fn find_index(&self, key: &K) -> Option<usize> {
        match self.lookup(key) {
            Probe::Found(idx) => Some(idx),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    fn slot(&self, idx: usize) -> Slot {
        Slot::new(idx, self.epoch)
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    // Writes a key known to be absent. `vacant` is the bucket the lookup
    // picked; it is discarded if the table has to grow first.
    fn place(&mut self, key: K, value: V, vacant: Option<usize>) -> usize {
        let mut target = vacant;
        match growth::on_insert(self.occupied, self.tombstoned, self.buckets.len()) {
            Growth::Grow(at_least) => {
                self.grow(at_least);
                target = None;
            }
            Growth::Rehash => {
                self.grow(self.buckets.len());
                target = None;
            }
            Growth::None => {}
        }
        let idx = match target {
            Some(idx) => idx,
            None => match self.lookup(&key) {
                Probe::Vacant(idx) => idx,
                Probe::Found(_) => unreachable!("key inserted twice"),
                Probe::Full => unreachable!("grown table has no free bucket"),
            },
        };
        if let Bucket::Tombstone = self.buckets[idx] {
            // A slot taken before the erase must not see the new entry.
            self.tombstoned -= 1;
            self.bump_epoch();
        }
        self.buckets[idx] = Bucket::Occupied(key, value);
        self.occupied += 1;
        debug_assert!(self.occupied + self.tombstoned <= self.buckets.len());
        idx
    }

    fn grow(&mut self, at_least: usize) {
        let new_len = growth::grown_size(at_least);
        log::trace!(
            "dense map: rehash {} -> {} buckets ({} entries, {} tombstones)",
            self.buckets.len(),
            new_len,
            self.occupied,
            self.tombstoned
        );
        let old = core::mem::replace(&mut self.buckets, empty_buckets(new_len));
        self.tombstoned = 0;
        self.bump_epoch();
        for bucket in old.into_vec() {
            if let Bucket::Occupied(k, v) = bucket {
                let idx = match self.lookup(&k) {
                    Probe::Vacant(idx) => idx,
                    Probe::Found(_) => unreachable!("key already in new table"),
                    Probe::Full => unreachable!("rehash target too small"),
                };
                self.buckets[idx] = Bucket::Occupied(k, v);
            }
        }
    }

    fn vacant_target(probe: Probe) -> Option<usize> {
        match probe {
            Probe::Vacant(idx) => Some(idx),
            Probe::Full | Probe::Found(_) => None,
        }
    }

    pub fn find(&self, key: &K) -> Option<(&K, &V)> {
        let idx = self.find_index(key)?;
        match &self.buckets[idx] {
            Bucket::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find_index(key)?;
        match &mut self.buckets[idx] {
            Bucket::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    /// 1 if `key` is present, else 0.
    pub fn count(&self, key: &K) -> usize {
        self.contains_key(key) as usize
    }

    /// Slot of `key`, usable with `erase_slot` until the table's layout changes.
    pub fn find_slot(&self, key: &K) -> Option<Slot> {
        self.find_index(key).map(|idx| self.slot(idx))
    }

    /// Inserts `key -> value` unless `key` is present. Returns the entry's
    /// slot and whether an insert happened; an existing value is kept.
    pub fn insert(&mut self, key: K, value: V) -> (Slot, bool) {
        self.try_emplace_with(key, || value)
    }

    /// Like `insert`, but only builds the value when the key is absent.
    pub fn try_emplace_with<F>(&mut self, key: K, make: F) -> (Slot, bool)
    where
        F: FnOnce() -> V,
    {
        let probe = self.lookup(&key);
        if let Probe::Found(idx) = probe {
            return (self.slot(idx), false);
        }
        let idx = self.place(key, make(), Self::vacant_target(probe));
        (self.slot(idx), true)
    }

    /// Inserts `key -> value`, replacing the value of an existing entry.
    /// The flag is true when the key was new.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Slot, bool) {
        let probe = self.lookup(&key);
        if let Probe::Found(idx) = probe {
            if let Bucket::Occupied(_, v) = &mut self.buckets[idx] {
                *v = value;
            }
            return (self.slot(idx), false);
        }
        let idx = self.place(key, value, Self::vacant_target(probe));
        (self.slot(idx), true)
    }

    /// Value for `key`, inserting `V::default()` first when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let idx = match self.lookup(&key) {
            Probe::Found(idx) => idx,
            probe => {
                let vacant = Self::vacant_target(probe);
                self.place(key, V::default(), vacant)
            }
        };
        match &mut self.buckets[idx] {
            Bucket::Occupied(_, v) => v,
            _ => unreachable!("bucket was just filled"),
        }
    }

    /// Copy of the value for `key`, or `V::default()` on a miss.
    pub fn lookup_or_default(&self, key: &K) -> V
    where
        V: Default + Clone,
    {
        self.get(key).cloned().unwrap_or_default()
    }

    /// Bounds-checked access: a miss is `Error::OutOfRange`.
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get(key).ok_or(Error::OutOfRange)
    }

    fn take_bucket(&mut self, idx: usize) -> Option<(K, V)> {
        match core::mem::replace(&mut self.buckets[idx], Bucket::Tombstone) {
            Bucket::Occupied(k, v) => {
                self.occupied -= 1;
                self.tombstoned += 1;
                Some((k, v))
            }
            other => {
                self.buckets[idx] = other;
                None
            }
        }
    }

    /// Removes `key`; returns whether it was present.
    pub fn erase(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let idx = self.find_index(key)?;
        self.take_bucket(idx)
    }

    /// Removes the entry at `slot` in O(1). A slot from an older layout
    /// resolves to `None` and leaves the map unchanged. Erasing leaves the
    /// slots of other entries valid, so slots collected from `iter_slots`
    /// can be erased one after another.
    pub fn erase_slot(&mut self, slot: Slot) -> Option<(K, V)> {
        if slot.epoch() != self.epoch || slot.index() >= self.buckets.len() {
            return None;
        }
        self.take_bucket(slot.index())
    }

    pub(crate) fn slot_entry(&self, slot: Slot) -> Option<(&K, &V)> {
        if slot.epoch() != self.epoch {
            return None;
        }
        match self.buckets.get(slot.index())? {
            Bucket::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub(crate) fn slot_value_mut(&mut self, slot: Slot) -> Option<&mut V> {
        if slot.epoch() != self.epoch {
            return None;
        }
        match self.buckets.get_mut(slot.index())? {
            Bucket::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        for bucket in self.buckets.iter_mut() {
            if let Bucket::Occupied(k, v) = bucket {
                if !keep(k, v) {
                    *bucket = Bucket::Tombstone;
                    removed += 1;
                }
            }
        }
        self.occupied -= removed;
        self.tombstoned += removed;
    }

    /// Removes every entry. A table left less than a quarter full is
    /// reallocated smaller; otherwise buckets are reset in place.
    pub fn clear(&mut self) {
        if self.occupied == 0 && self.tombstoned == 0 {
            return;
        }
        if growth::should_shrink_on_clear(self.occupied, self.buckets.len()) {
            self.shrink_and_clear();
            return;
        }
        for bucket in self.buckets.iter_mut() {
            *bucket = Bucket::Empty;
        }
        self.occupied = 0;
        self.tombstoned = 0;
        self.bump_epoch();
    }

    /// Removes every entry and reallocates at a size fitted to the number
    /// of entries that were present.
    pub fn shrink_and_clear(&mut self) {
        let target = growth::shrink_target(self.occupied);
        log::trace!(
            "dense map: shrink {} -> {} buckets on clear ({} entries)",
            self.buckets.len(),
            target,
            self.occupied
        );
        if target == self.buckets.len() {
            for bucket in self.buckets.iter_mut() {
                *bucket = Bucket::Empty;
            }
        } else {
            self.buckets = empty_buckets(target);
        }
        self.occupied = 0;
        self.tombstoned = 0;
        self.bump_epoch();
    }

    /// Grows so that `entries` entries fit without further growth.
    pub fn reserve(&mut self, entries: usize) {
        let want = growth::buckets_for_entries(entries);
        if want > self.buckets.len() {
            self.grow(want);
        }
    }

    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            remaining: self.occupied,
        }
    }

    /// Like `iter`, but also yields each entry's slot.
    pub fn iter_slots(&self) -> impl Iterator<Item = (Slot, &K, &V)> + '_ {
        let epoch = self.epoch;
        self.buckets
            .iter()
            .enumerate()
            .filter_map(move |(idx, bucket)| match bucket {
                Bucket::Occupied(k, v) => Some((Slot::new(idx, epoch), k, v)),
                _ => None,
            })
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            remaining: self.occupied,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V, P> Default for DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, P> Clone for DenseMap<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            occupied: self.occupied,
            tombstoned: self.tombstoned,
            epoch: 0,
            _policy: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P> fmt::Debug for DenseMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.buckets.iter().filter_map(|b| match b {
            Bucket::Occupied(k, v) => Some((k, v)),
            _ => None,
        });
        f.debug_map().entries(entries).finish()
    }
}

impl<K, V, P> Extend<(K, V)> for DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, P> FromIterator<(K, V)> for DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::new();
        map.reserve(iter.size_hint().0);
        map.extend(iter);
        map
    }
}

/// Iterator over occupied buckets in physical order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let Bucket::Occupied(k, v) = bucket {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable iterator over occupied buckets in physical order.
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Bucket<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let Bucket::Occupied(k, v) = bucket {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over the entries of a `DenseMap`.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Bucket<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let Bucket::Occupied(k, v) = bucket {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, P> IntoIterator for DenseMap<K, V, P> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            remaining: self.occupied,
            buckets: self.buckets.into_vec().into_iter(),
        }
    }
}

impl<'a, K, V, P> IntoIterator for &'a DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, P> IntoIterator for &'a mut DenseMap<K, V, P>
where
    P: KeyPolicy<K>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    // Sends every key to the same home bucket so probing and tombstone
    // handling carry the whole load.
    struct Colliding;
    impl KeyPolicy<u32> for Colliding {
        fn empty_key() -> u32 {
            u32::MAX
        }
        fn tombstone_key() -> u32 {
            u32::MAX - 1
        }
        fn hash_value(_: &u32) -> u32 {
            0
        }
        fn is_equal(lhs: &u32, rhs: &u32) -> bool {
            lhs == rhs
        }
    }

    /// Invariant: lookups on a table that was never allocated report a miss
    /// without allocating.
    #[test]
    fn zero_capacity_lookups_do_not_allocate() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        assert_eq!(m.num_buckets(), 0);
        assert!(m.find(&1).is_none());
        assert_eq!(m.count(&1), 0);
        assert!(!m.erase(&1));
        assert!(m.find_slot(&1).is_none());
        assert_eq!(m.num_buckets(), 0);
    }

    #[test]
    fn first_insert_allocates_floor() {
        let mut m: DenseMap<u32, &str> = DenseMap::new();
        let (_, inserted) = m.insert(7, "seven");
        assert!(inserted);
        assert_eq!(m.num_buckets(), growth::MIN_BUCKETS);
        assert_eq!(m.get(&7), Some(&"seven"));
    }

    /// Invariant: `insert` keeps the stored value on a duplicate key while
    /// `insert_or_assign` replaces it; neither changes `len`.
    #[test]
    fn insert_vs_insert_or_assign() {
        let mut m: DenseMap<u32, i32> = DenseMap::new();
        assert!(m.insert(1, 10).1);
        assert!(!m.insert(1, 20).1);
        assert_eq!(m.get(&1), Some(&10));
        assert!(!m.insert_or_assign(1, 30).1);
        assert_eq!(m.get(&1), Some(&30));
        assert_eq!(m.len(), 1);
        assert!(m.insert_or_assign(2, 40).1);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn try_emplace_with_is_lazy() {
        let mut m: DenseMap<u32, String> = DenseMap::new();
        let calls = Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            "v".to_string()
        };
        assert!(m.try_emplace_with(5, make).1);
        assert!(!m
            .try_emplace_with(5, || {
                calls.set(calls.get() + 1);
                "w".to_string()
            })
            .1);
        assert_eq!(calls.get(), 1);
        assert_eq!(m.get(&5).map(String::as_str), Some("v"));
    }

    /// Invariant: a full probe chain of colliding keys stays searchable after
    /// erasing from its middle; tombstones keep later keys reachable.
    #[test]
    fn tombstones_keep_probe_chains_intact() {
        let mut m: DenseMap<u32, u32, Colliding> = DenseMap::new();
        for k in 0..20 {
            m.insert(k, k * 2);
        }
        for k in (0..20).step_by(2) {
            assert!(m.erase(&k));
        }
        assert_eq!(m.len(), 10);
        assert_eq!(m.num_tombstones(), 10);
        for k in 0..20 {
            assert_eq!(m.get(&k).copied(), if k % 2 == 1 { Some(k * 2) } else { None });
        }
        // Re-inserting reuses a tombstone.
        m.insert(100, 1);
        assert_eq!(m.num_tombstones(), 9);
        assert_eq!(m.get(&100), Some(&1));
    }

    /// Invariant: heavy insert/erase churn at constant size triggers the
    /// in-place rehash and clears tombstones without growing.
    #[test]
    fn churn_rehashes_in_place() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        for k in 0..10 {
            m.insert(k, k);
        }
        let buckets = m.num_buckets();
        let mut next = 10;
        for _ in 0..500 {
            m.insert(next, next);
            assert!(m.erase(&(next - 10)));
            next += 1;
        }
        assert_eq!(m.len(), 10);
        assert_eq!(m.num_buckets(), buckets);
        assert!(m.num_tombstones() + m.len() < buckets);
        for k in next - 10..next {
            assert_eq!(m.get(&k), Some(&k));
        }
    }

    #[test]
    fn slots_resolve_until_layout_changes() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        let (s1, _) = m.insert(1, 100);
        let (s2, _) = m.insert(2, 200);
        assert_eq!(s1.key(&m), Some(&1));
        assert_eq!(s2.value(&m), Some(&200));
        *s2.value_mut(&mut m).unwrap() += 1;
        assert_eq!(m.get(&2), Some(&201));

        assert_eq!(m.erase_slot(s1), Some((1, 100)));
        assert!(s1.key(&m).is_none());
        // Other entries did not move.
        assert_eq!(s2.value(&m), Some(&201));
        assert_eq!(m.erase_slot(s2), Some((2, 201)));
        assert!(m.erase_slot(s2).is_none());
        assert!(m.is_empty());
    }

    /// Invariant: a slot whose entry was erased never resolves to the entry
    /// that later reuses its tombstone.
    #[test]
    fn reused_tombstone_does_not_revive_slot() {
        let mut m: DenseMap<u32, u32, Colliding> = DenseMap::new();
        let (s, _) = m.insert(1, 10);
        m.erase(&1);
        let (fresh, _) = m.insert(2, 20);
        assert_eq!(fresh.index(), s.index());
        assert!(s.value(&m).is_none());
        assert!(m.erase_slot(s).is_none());
        assert_eq!(fresh.value(&m), Some(&20));
    }

    #[test]
    fn erase_through_iter_slots() {
        let mut m: DenseMap<u32, u32> = (0..200).map(|k| (k, k)).collect();
        let doomed: Vec<Slot> = m
            .iter_slots()
            .filter(|(_, k, _)| *k % 3 == 0)
            .map(|(s, _, _)| s)
            .collect();
        assert_eq!(doomed.len(), 67);
        for s in doomed {
            let (k, _) = m.erase_slot(s).unwrap();
            assert_eq!(k % 3, 0);
        }
        assert_eq!(m.len(), 133);
        assert!(m.keys().all(|k| k % 3 != 0));
    }

    #[test]
    fn slot_is_invalidated_by_growth() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        let (s, _) = m.insert(0, 0);
        for k in 1..200 {
            m.insert(k, k);
        }
        assert!(s.value(&m).is_none());
        assert_eq!(m.find_slot(&0).and_then(|s| s.value(&m).copied()), Some(0));
    }

    #[test]
    fn at_reports_out_of_range() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        m.insert(3, 9);
        assert_eq!(m.at(&3), Ok(&9));
        assert_eq!(m.at(&4), Err(Error::OutOfRange));
        assert_eq!(m.lookup_or_default(&4), 0);
        assert_eq!(m.lookup_or_default(&3), 9);
    }

    #[test]
    fn get_or_insert_default_acts_like_subscript() {
        let mut m: DenseMap<char, usize> = DenseMap::new();
        for c in "abracadabra".chars() {
            *m.get_or_insert_default(c) += 1;
        }
        assert_eq!(m.get(&'a'), Some(&5));
        assert_eq!(m.get(&'b'), Some(&2));
        assert_eq!(m.get(&'c'), Some(&1));
        assert_eq!(m.len(), 5);
    }

    /// Invariant: clearing a sparse large table releases memory; clearing a
    /// dense one resets in place.
    #[test]
    fn clear_shrinks_sparse_tables() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        for k in 0..1000 {
            m.insert(k, k);
        }
        let big = m.num_buckets();
        for k in 0..990 {
            m.erase(&k);
        }
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.num_tombstones(), 0);
        assert!(m.num_buckets() < big);
        assert_eq!(m.num_buckets(), growth::MIN_BUCKETS);

        for k in 0..40 {
            m.insert(k, k);
        }
        m.clear();
        assert_eq!(m.num_buckets(), growth::MIN_BUCKETS);
        assert!(m.iter().next().is_none());
    }

    /// Invariant: values are dropped exactly once across erase, clear, growth
    /// and drop of the map.
    #[test]
    fn values_dropped_exactly_once() {
        let token = Rc::new(());
        {
            let mut m: DenseMap<u32, Rc<()>> = DenseMap::new();
            for k in 0..300 {
                m.insert(k, token.clone());
            }
            assert_eq!(Rc::strong_count(&token), 301);
            for k in 0..100 {
                m.erase(&k);
            }
            assert_eq!(Rc::strong_count(&token), 201);
            m.retain(|k, _| k % 2 == 0);
            assert_eq!(Rc::strong_count(&token), 1 + m.len());
            m.clear();
            assert_eq!(Rc::strong_count(&token), 1);
            m.insert(1, token.clone());
        }
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn iteration_yields_every_live_entry_once() {
        let mut m: DenseMap<u64, u64> = DenseMap::new();
        for k in 0..100u64 {
            m.insert(k, k * k);
        }
        for k in (0..100u64).filter(|k| k % 3 == 0) {
            m.erase(&k);
        }
        let keys: BTreeSet<u64> = m.keys().copied().collect();
        let expected: BTreeSet<u64> = (0..100).filter(|k| k % 3 != 0).collect();
        assert_eq!(keys, expected);
        assert_eq!(m.iter().count(), m.len());
        assert_eq!(m.iter_mut().count(), m.len());

        for (_, v) in m.iter_mut() {
            *v += 1;
        }
        assert!(m.iter().all(|(k, v)| *v == k * k + 1));

        let owned: BTreeSet<u64> = m.clone().into_iter().map(|(k, _)| k).collect();
        assert_eq!(owned, expected);
    }

    #[test]
    fn clone_is_independent() {
        let mut a: DenseMap<(u32, u32), u32> = DenseMap::new();
        a.insert((1, 2), 3);
        let mut b = a.clone();
        b.insert((4, 5), 6);
        b.erase(&(1, 2));
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(&(1, 2)), Some(&3));
        assert_eq!(b.len(), 1);
        assert_eq!(b.get(&(4, 5)), Some(&6));
    }

    #[test]
    fn reserve_prevents_growth() {
        let mut m: DenseMap<u32, u32> = DenseMap::new();
        m.reserve(500);
        let buckets = m.num_buckets();
        for k in 0..500 {
            m.insert(k, k);
        }
        assert_eq!(m.num_buckets(), buckets);
    }

    #[test]
    fn str_keys_by_content() {
        let owned = String::from("alpha");
        let mut m: DenseMap<&str, u32> = DenseMap::new();
        m.insert("alpha", 1);
        m.insert("", 2);
        assert_eq!(m.get(&owned.as_str()), Some(&1));
        assert_eq!(m.get(&""), Some(&2));
        assert!(m.get(&"alph").is_none());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn reserved_key_is_rejected_in_debug() {
        let res = std::panic::catch_unwind(|| {
            let mut m: DenseMap<u32, u32> = DenseMap::new();
            m.insert(u32::MAX, 0);
        });
        assert!(res.is_err(), "expected sentinel key to assert in debug builds");
    }
}
