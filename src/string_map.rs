//! StringMap: interned byte-string keys with one owned copy per key.
//!
//! Entries live in a generational arena; the table itself is a pair of
//! parallel arrays holding the bucket state and the full hash of each
//! occupied bucket's key. Probing compares cached hashes first and only
//! touches an entry's bytes on a hash match. Growth moves arena keys and
//! cached hashes between bucket arrays; entries themselves never move, so
//! a `Handle` stays valid until its own key is erased.

use crate::error::Error;
use crate::growth::{self, Growth};
use crate::hash::hash_bytes;
use crate::probe::ProbeSeq;
use core::fmt;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SlotMap};

/// Stable reference to an interned entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn entry<'a, V>(&self, map: &'a StringMap<V>) -> Option<&'a StringMapEntry<V>> {
        map.entries.get(self.0)
    }

    pub fn key<'a, V>(&self, map: &'a StringMap<V>) -> Option<&'a [u8]> {
        self.entry(map).map(StringMapEntry::key)
    }

    pub fn value<'a, V>(&self, map: &'a StringMap<V>) -> Option<&'a V> {
        self.entry(map).map(StringMapEntry::value)
    }

    pub fn value_mut<'a, V>(&self, map: &'a mut StringMap<V>) -> Option<&'a mut V> {
        map.entries.get_mut(self.0).map(StringMapEntry::value_mut)
    }
}

/// An interned key and its value.
///
/// The key is stored once with a trailing NUL so it can be handed to code
/// expecting a C string without copying. Embedded NULs are allowed; the
/// key length, not the terminator, delimits it.
pub struct StringMapEntry<V> {
    // key bytes followed by one 0 byte
    bytes: Box<[u8]>,
    hash: u32,
    value: V,
}

impl<V> StringMapEntry<V> {
    fn new(key: &[u8], hash: u32, value: V) -> Self {
        let mut bytes = Vec::with_capacity(key.len() + 1);
        bytes.extend_from_slice(key);
        bytes.push(0);
        Self {
            bytes: bytes.into_boxed_slice(),
            hash,
            value,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.bytes[..self.key_len()]
    }

    pub fn key_len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Key bytes including the terminating NUL.
    pub fn key_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// The key as UTF-8, if it is valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        core::str::from_utf8(self.key()).ok()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V: fmt::Debug> fmt::Debug for StringMapEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringMapEntry")
            .field("key", &String::from_utf8_lossy(self.key()))
            .field("value", &self.value)
            .finish()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum BucketRef {
    Empty,
    Tombstone,
    Occupied(DefaultKey),
}

enum Probe {
    Found(usize, DefaultKey),
    Vacant(usize),
    Full,
}

pub struct StringMap<V> {
    entries: SlotMap<DefaultKey, StringMapEntry<V>>,
    buckets: Vec<BucketRef>,
    hashes: Vec<u32>,
    tombstoned: usize,
}

impl<V> StringMap<V> {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            buckets: Vec::new(),
            hashes: Vec::new(),
            tombstoned: 0,
        }
    }

    /// Creates a map that holds `entries` keys without growing.
    pub fn with_capacity(entries: usize) -> Self {
        let n = growth::buckets_for_entries(entries);
        Self {
            entries: SlotMap::with_capacity_and_key(entries),
            buckets: vec![BucketRef::Empty; n],
            hashes: vec![0; n],
            tombstoned: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
    pub fn num_tombstones(&self) -> usize {
        self.tombstoned
    }

    fn lookup(&self, key: &[u8], full_hash: u32) -> Probe {
        let mut first_tombstone = None;
        for idx in ProbeSeq::new(full_hash, self.buckets.len()) {
            match self.buckets[idx] {
                BucketRef::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                BucketRef::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                BucketRef::Occupied(k) => {
                    if self.hashes[idx] == full_hash && self.entries[k].key() == key {
                        return Probe::Found(idx, k);
                    }
                }
            }
        }
        match first_tombstone {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }

    fn find_key(&self, key: &[u8]) -> Option<(usize, DefaultKey)> {
        match self.lookup(key, hash_bytes(key)) {
            Probe::Found(idx, k) => Some((idx, k)),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    // Moves arena keys and cached hashes into a fresh bucket array. Keys
    // are not compared: every occupied bucket is known to be distinct.
    fn rehash(&mut self, new_len: usize) {
        log::trace!(
            "string map: rehash {} -> {} buckets ({} entries, {} tombstones)",
            self.buckets.len(),
            new_len,
            self.entries.len(),
            self.tombstoned
        );
        let old_buckets = core::mem::replace(&mut self.buckets, vec![BucketRef::Empty; new_len]);
        let old_hashes = core::mem::replace(&mut self.hashes, vec![0; new_len]);
        for (bucket, hash) in old_buckets.into_iter().zip(old_hashes) {
            if let BucketRef::Occupied(k) = bucket {
                let slot = ProbeSeq::new(hash, new_len)
                    .find(|&i| self.buckets[i] == BucketRef::Empty);
                match slot {
                    Some(i) => {
                        self.buckets[i] = BucketRef::Occupied(k);
                        self.hashes[i] = hash;
                    }
                    None => unreachable!("rehash target too small"),
                }
            }
        }
        self.tombstoned = 0;
    }

    fn emplace<F>(&mut self, key: &[u8], make: F) -> (DefaultKey, bool)
    where
        F: FnOnce() -> V,
    {
        let full_hash = hash_bytes(key);
        let mut target = match self.lookup(key, full_hash) {
            Probe::Found(_, k) => return (k, false),
            Probe::Vacant(idx) => Some(idx),
            Probe::Full => None,
        };
        // Built before any counter or bucket changes so a panicking
        // constructor leaves the table as it was.
        let entry = StringMapEntry::new(key, full_hash, make());
        match growth::on_insert(self.len(), self.tombstoned, self.buckets.len()) {
            Growth::Grow(at_least) => {
                self.rehash(growth::grown_size(at_least));
                target = None;
            }
            Growth::Rehash => {
                self.rehash(growth::grown_size(self.buckets.len()));
                target = None;
            }
            Growth::None => {}
        }
        let idx = match target {
            Some(idx) => idx,
            None => match self.lookup(key, full_hash) {
                Probe::Vacant(idx) => idx,
                Probe::Found(..) => unreachable!("key interned twice"),
                Probe::Full => unreachable!("grown table has no free bucket"),
            },
        };
        if self.buckets[idx] == BucketRef::Tombstone {
            self.tombstoned -= 1;
        }
        let k = self.entries.insert(entry);
        self.buckets[idx] = BucketRef::Occupied(k);
        self.hashes[idx] = full_hash;
        debug_assert!(self.len() + self.tombstoned <= self.buckets.len());
        (k, true)
    }

    pub fn find<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> Option<Handle> {
        self.find_key(key.as_ref()).map(|(_, k)| Handle(k))
    }

    pub fn get<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> Option<&V> {
        let (_, k) = self.find_key(key.as_ref())?;
        Some(&self.entries[k].value)
    }

    pub fn get_mut<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q) -> Option<&mut V> {
        let (_, k) = self.find_key(key.as_ref())?;
        Some(&mut self.entries[k].value)
    }

    pub fn contains_key<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> bool {
        self.find_key(key.as_ref()).is_some()
    }

    pub fn count<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> usize {
        self.contains_key(key) as usize
    }

    /// Interns `key -> value` unless `key` is present, in which case the
    /// stored value is kept. Returns the entry's handle and whether an
    /// insert happened.
    pub fn try_emplace<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q, value: V) -> (Handle, bool) {
        let (k, inserted) = self.emplace(key.as_ref(), || value);
        (Handle(k), inserted)
    }

    /// Like `try_emplace`, but only builds the value when the key is new.
    pub fn try_emplace_with<Q, F>(&mut self, key: &Q, make: F) -> (Handle, bool)
    where
        Q: AsRef<[u8]> + ?Sized,
        F: FnOnce() -> V,
    {
        let (k, inserted) = self.emplace(key.as_ref(), make);
        (Handle(k), inserted)
    }

    /// Pair form of `try_emplace`.
    pub fn insert<Q: AsRef<[u8]>>(&mut self, (key, value): (Q, V)) -> (Handle, bool) {
        self.try_emplace(&key, value)
    }

    /// Interns `key -> value`, replacing the value if the key is present.
    pub fn insert_or_assign<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q, value: V) -> (Handle, bool) {
        let mut value = Some(value);
        let (k, inserted) = self.emplace(key.as_ref(), || match value.take() {
            Some(v) => v,
            None => unreachable!("value consumed once"),
        });
        if let Some(v) = value {
            self.entries[k].value = v;
        }
        (Handle(k), inserted)
    }

    /// Value for `key`, interning it with `V::default()` first when absent.
    pub fn get_or_insert_default<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q) -> &mut V
    where
        V: Default,
    {
        let (k, _) = self.emplace(key.as_ref(), V::default);
        &mut self.entries[k].value
    }

    /// Copy of the value for `key`, or `V::default()` on a miss.
    pub fn lookup_or_default<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> V
    where
        V: Default + Clone,
    {
        self.get(key).cloned().unwrap_or_default()
    }

    /// Bounds-checked access: a miss is `Error::OutOfRange`.
    pub fn at<Q: AsRef<[u8]> + ?Sized>(&self, key: &Q) -> Result<&V, Error> {
        self.get(key).ok_or(Error::OutOfRange)
    }

    // Unlinks bucket `idx` and frees its entry.
    fn take_bucket(&mut self, idx: usize, k: DefaultKey) -> Option<StringMapEntry<V>> {
        debug_assert_eq!(self.buckets[idx], BucketRef::Occupied(k));
        self.buckets[idx] = BucketRef::Tombstone;
        self.tombstoned += 1;
        self.entries.remove(k)
    }

    pub fn erase<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q) -> bool {
        self.remove(key).is_some()
    }

    pub fn remove<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q) -> Option<V> {
        self.remove_entry(key).map(StringMapEntry::into_value)
    }

    pub fn remove_entry<Q: AsRef<[u8]> + ?Sized>(&mut self, key: &Q) -> Option<StringMapEntry<V>> {
        let (idx, k) = self.find_key(key.as_ref())?;
        self.take_bucket(idx, k)
    }

    /// Removes the entry behind `handle`. A stale handle returns `None`.
    pub fn erase_handle(&mut self, handle: Handle) -> Option<StringMapEntry<V>> {
        let hash = self.entries.get(handle.0)?.hash;
        let idx = ProbeSeq::new(hash, self.buckets.len())
            .find(|&i| self.buckets[i] == BucketRef::Occupied(handle.0))?;
        self.take_bucket(idx, handle.0)
    }

    /// Frees every entry and resets all buckets to empty in place.
    pub fn clear(&mut self) {
        if self.entries.is_empty() && self.tombstoned == 0 {
            return;
        }
        self.entries.clear();
        self.buckets.fill(BucketRef::Empty);
        self.tombstoned = 0;
    }

    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    pub fn reserve(&mut self, entries: usize) {
        let want = growth::buckets_for_entries(entries);
        if want > self.buckets.len() {
            self.rehash(growth::grown_size(want));
        }
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            entries: &self.entries,
            remaining: self.entries.len(),
        }
    }

    /// Mutable access to every entry, in arena order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.iter().map(|(_, e)| e.key())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, e)| e.value())
    }
}

impl<V> Default for StringMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for StringMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .map(|(_, e)| (String::from_utf8_lossy(e.key()), e.value())),
            )
            .finish()
    }
}

impl<Q: AsRef<[u8]>, V> Extend<(Q, V)> for StringMap<V> {
    fn extend<I: IntoIterator<Item = (Q, V)>>(&mut self, iter: I) {
        for kv in iter {
            self.insert(kv);
        }
    }
}

impl<Q: AsRef<[u8]>, V> FromIterator<(Q, V)> for StringMap<V> {
    fn from_iter<I: IntoIterator<Item = (Q, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        map.extend(iter);
        map
    }
}

/// Iterator over entries in physical bucket order.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, BucketRef>,
    entries: &'a SlotMap<DefaultKey, StringMapEntry<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Handle, &'a StringMapEntry<V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.buckets.by_ref() {
            if let BucketRef::Occupied(k) = *bucket {
                self.remaining -= 1;
                return Some((Handle(k), &self.entries[k]));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// Mutable iterator over entries.
pub struct IterMut<'a, V> {
    inner: slotmap::basic::IterMut<'a, DefaultKey, StringMapEntry<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (Handle, &'a [u8], &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, e)| {
            let len = e.bytes.len() - 1;
            (Handle(k), &e.bytes[..len], &mut e.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, V> IntoIterator for &'a StringMap<V> {
    type Item = (Handle, &'a StringMapEntry<V>);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}
