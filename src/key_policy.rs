//! Key policies: reserved sentinels, hashing and equality per key type.
//!
//! A policy is a zero-sized type implementing `KeyPolicy<K>`. The tables
//! never store the sentinels (bucket state is an explicit tag), but every
//! key handed to a table is checked against them in debug builds so the
//! contract stays the same as for a sentinel-encoded table: neither
//! reserved value is ever a real key.

use crate::hash::{combine, hash_bytes};

/// Static key behavior used by `DenseMap` and `DenseSet`.
pub trait KeyPolicy<K> {
    /// Reserved value marking an empty bucket.
    fn empty_key() -> K;

    /// Reserved value marking an erased bucket. Distinct from `empty_key`.
    fn tombstone_key() -> K;

    fn hash_value(key: &K) -> u32;

    fn is_equal(lhs: &K, rhs: &K) -> bool;

    /// True when `key` equals one of the two reserved values.
    #[inline]
    fn is_reserved(key: &K) -> bool {
        Self::is_equal(key, &Self::empty_key()) || Self::is_equal(key, &Self::tombstone_key())
    }
}

/// Policy for the built-in key types.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultKeyPolicy;

macro_rules! unsigned_policy {
    ($($t:ty),*) => {$(
        impl KeyPolicy<$t> for DefaultKeyPolicy {
            #[inline]
            fn empty_key() -> $t { <$t>::MAX }
            #[inline]
            fn tombstone_key() -> $t { <$t>::MAX - 1 }
            #[inline]
            fn hash_value(key: &$t) -> u32 { (*key as u64).wrapping_mul(37) as u32 }
            #[inline]
            fn is_equal(lhs: &$t, rhs: &$t) -> bool { lhs == rhs }
        }
    )*};
}

macro_rules! signed_policy {
    ($($t:ty),*) => {$(
        impl KeyPolicy<$t> for DefaultKeyPolicy {
            #[inline]
            fn empty_key() -> $t { <$t>::MAX }
            #[inline]
            fn tombstone_key() -> $t { <$t>::MIN }
            #[inline]
            fn hash_value(key: &$t) -> u32 { (*key as i64 as u64).wrapping_mul(37) as u32 }
            #[inline]
            fn is_equal(lhs: &$t, rhs: &$t) -> bool { lhs == rhs }
        }
    )*};
}

unsigned_policy!(u8, u16, u32, u64, usize);
signed_policy!(i8, i16, i32, i64, isize);

impl KeyPolicy<char> for DefaultKeyPolicy {
    #[inline]
    fn empty_key() -> char {
        char::MAX
    }
    #[inline]
    fn tombstone_key() -> char {
        '\u{10FFFE}'
    }
    #[inline]
    fn hash_value(key: &char) -> u32 {
        (*key as u32).wrapping_mul(37)
    }
    #[inline]
    fn is_equal(lhs: &char, rhs: &char) -> bool {
        lhs == rhs
    }
}

// Pointers are assumed at least 4-byte aligned, so the two low bits of the
// sentinels are never produced by a real allocation.
const POINTER_LOW_BITS: u32 = 2;

#[inline]
fn pointer_hash(addr: usize) -> u32 {
    ((addr as u32) >> 4) ^ ((addr as u32) >> 9)
}

impl<T> KeyPolicy<*const T> for DefaultKeyPolicy {
    #[inline]
    fn empty_key() -> *const T {
        (usize::MAX << POINTER_LOW_BITS) as *const T
    }
    #[inline]
    fn tombstone_key() -> *const T {
        ((usize::MAX - 1) << POINTER_LOW_BITS) as *const T
    }
    #[inline]
    fn hash_value(key: &*const T) -> u32 {
        pointer_hash(*key as usize)
    }
    #[inline]
    fn is_equal(lhs: &*const T, rhs: &*const T) -> bool {
        core::ptr::eq(*lhs, *rhs)
    }
}

impl<T> KeyPolicy<*mut T> for DefaultKeyPolicy {
    #[inline]
    fn empty_key() -> *mut T {
        (usize::MAX << POINTER_LOW_BITS) as *mut T
    }
    #[inline]
    fn tombstone_key() -> *mut T {
        ((usize::MAX - 1) << POINTER_LOW_BITS) as *mut T
    }
    #[inline]
    fn hash_value(key: &*mut T) -> u32 {
        pointer_hash(*key as usize)
    }
    #[inline]
    fn is_equal(lhs: &*mut T, rhs: &*mut T) -> bool {
        core::ptr::eq(*lhs, *rhs)
    }
}

impl<A, B> KeyPolicy<(A, B)> for DefaultKeyPolicy
where
    DefaultKeyPolicy: KeyPolicy<A> + KeyPolicy<B>,
{
    fn empty_key() -> (A, B) {
        (
            <Self as KeyPolicy<A>>::empty_key(),
            <Self as KeyPolicy<B>>::empty_key(),
        )
    }
    fn tombstone_key() -> (A, B) {
        (
            <Self as KeyPolicy<A>>::tombstone_key(),
            <Self as KeyPolicy<B>>::tombstone_key(),
        )
    }
    fn hash_value(key: &(A, B)) -> u32 {
        combine(
            <Self as KeyPolicy<A>>::hash_value(&key.0),
            <Self as KeyPolicy<B>>::hash_value(&key.1),
        )
    }
    fn is_equal(lhs: &(A, B), rhs: &(A, B)) -> bool {
        <Self as KeyPolicy<A>>::is_equal(&lhs.0, &rhs.0)
            && <Self as KeyPolicy<B>>::is_equal(&lhs.1, &rhs.1)
    }
}

impl<A, B, C> KeyPolicy<(A, B, C)> for DefaultKeyPolicy
where
    DefaultKeyPolicy: KeyPolicy<A> + KeyPolicy<B> + KeyPolicy<C>,
{
    fn empty_key() -> (A, B, C) {
        (
            <Self as KeyPolicy<A>>::empty_key(),
            <Self as KeyPolicy<B>>::empty_key(),
            <Self as KeyPolicy<C>>::empty_key(),
        )
    }
    fn tombstone_key() -> (A, B, C) {
        (
            <Self as KeyPolicy<A>>::tombstone_key(),
            <Self as KeyPolicy<B>>::tombstone_key(),
            <Self as KeyPolicy<C>>::tombstone_key(),
        )
    }
    fn hash_value(key: &(A, B, C)) -> u32 {
        combine(
            combine(
                <Self as KeyPolicy<A>>::hash_value(&key.0),
                <Self as KeyPolicy<B>>::hash_value(&key.1),
            ),
            <Self as KeyPolicy<C>>::hash_value(&key.2),
        )
    }
    fn is_equal(lhs: &(A, B, C), rhs: &(A, B, C)) -> bool {
        <Self as KeyPolicy<A>>::is_equal(&lhs.0, &rhs.0)
            && <Self as KeyPolicy<B>>::is_equal(&lhs.1, &rhs.1)
            && <Self as KeyPolicy<C>>::is_equal(&lhs.2, &rhs.2)
    }
}

// Borrowed byte views use zero-length slices into two private statics as
// sentinels; they are told apart from real keys by address, never by
// content. The differing contents keep the two statics from being merged.
static EMPTY_VIEW: [u8; 1] = [0xff];
static TOMBSTONE_VIEW: [u8; 1] = [0xfe];

#[inline]
fn sentinel_of(bytes: &[u8]) -> Option<*const u8> {
    let p = bytes.as_ptr();
    if bytes.is_empty() && (p == EMPTY_VIEW.as_ptr() || p == TOMBSTONE_VIEW.as_ptr()) {
        Some(p)
    } else {
        None
    }
}

#[inline]
fn view_equal(lhs: &[u8], rhs: &[u8]) -> bool {
    match (sentinel_of(lhs), sentinel_of(rhs)) {
        (None, None) => lhs == rhs,
        (l, r) => l == r,
    }
}

impl<'a> KeyPolicy<&'a [u8]> for DefaultKeyPolicy {
    #[inline]
    fn empty_key() -> &'a [u8] {
        &EMPTY_VIEW[..0]
    }
    #[inline]
    fn tombstone_key() -> &'a [u8] {
        &TOMBSTONE_VIEW[..0]
    }
    #[inline]
    fn hash_value(key: &&'a [u8]) -> u32 {
        debug_assert!(sentinel_of(key).is_none(), "cannot hash a reserved key");
        hash_bytes(key)
    }
    #[inline]
    fn is_equal(lhs: &&'a [u8], rhs: &&'a [u8]) -> bool {
        view_equal(lhs, rhs)
    }
}

impl<'a> KeyPolicy<&'a str> for DefaultKeyPolicy {
    #[inline]
    fn empty_key() -> &'a str {
        core::str::from_utf8(&EMPTY_VIEW[..0]).unwrap_or_default()
    }
    #[inline]
    fn tombstone_key() -> &'a str {
        core::str::from_utf8(&TOMBSTONE_VIEW[..0]).unwrap_or_default()
    }
    #[inline]
    fn hash_value(key: &&'a str) -> u32 {
        debug_assert!(sentinel_of(key.as_bytes()).is_none(), "cannot hash a reserved key");
        hash_bytes(key.as_bytes())
    }
    #[inline]
    fn is_equal(lhs: &&'a str, rhs: &&'a str) -> bool {
        view_equal(lhs.as_bytes(), rhs.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_sentinels<K, P: KeyPolicy<K>>() {
        let e = P::empty_key();
        let t = P::tombstone_key();
        assert!(P::is_equal(&e, &e));
        assert!(P::is_equal(&t, &t));
        assert!(!P::is_equal(&e, &t));
        assert!(P::is_reserved(&e));
        assert!(P::is_reserved(&t));
    }

    /// Invariant: empty and tombstone keys are distinct for every built-in key type.
    #[test]
    fn sentinels_are_distinct() {
        check_sentinels::<u8, DefaultKeyPolicy>();
        check_sentinels::<u32, DefaultKeyPolicy>();
        check_sentinels::<u64, DefaultKeyPolicy>();
        check_sentinels::<usize, DefaultKeyPolicy>();
        check_sentinels::<i32, DefaultKeyPolicy>();
        check_sentinels::<i64, DefaultKeyPolicy>();
        check_sentinels::<char, DefaultKeyPolicy>();
        check_sentinels::<*const u64, DefaultKeyPolicy>();
        check_sentinels::<*mut u64, DefaultKeyPolicy>();
        check_sentinels::<(u32, i32), DefaultKeyPolicy>();
        check_sentinels::<(u32, u64, char), DefaultKeyPolicy>();
        check_sentinels::<&[u8], DefaultKeyPolicy>();
        check_sentinels::<&str, DefaultKeyPolicy>();
    }

    #[test]
    fn integer_hash_is_multiplicative() {
        assert_eq!(<DefaultKeyPolicy as KeyPolicy<u32>>::hash_value(&3), 111);
        assert_eq!(<DefaultKeyPolicy as KeyPolicy<i32>>::hash_value(&-1), (-37i32) as u32);
        assert!(!<DefaultKeyPolicy as KeyPolicy<u32>>::is_reserved(&0));
    }

    /// Invariant: a real empty slice is neither sentinel, even though all three
    /// have length zero.
    #[test]
    fn empty_view_is_not_reserved() {
        let real: &[u8] = &[];
        assert!(!<DefaultKeyPolicy as KeyPolicy<&[u8]>>::is_reserved(&real));
        let s: &str = "";
        assert!(!<DefaultKeyPolicy as KeyPolicy<&str>>::is_reserved(&s));
        let other = String::new();
        assert!(<DefaultKeyPolicy as KeyPolicy<&str>>::is_equal(&s, &other.as_str()));
    }

    #[test]
    fn pair_equality_requires_both_halves() {
        type P = DefaultKeyPolicy;
        assert!(<P as KeyPolicy<(u32, u32)>>::is_equal(&(1, 2), &(1, 2)));
        assert!(!<P as KeyPolicy<(u32, u32)>>::is_equal(&(1, 2), &(1, 3)));
        assert_ne!(
            <P as KeyPolicy<(u32, u32)>>::hash_value(&(1, 2)),
            <P as KeyPolicy<(u32, u32)>>::hash_value(&(2, 1))
        );
    }
}
