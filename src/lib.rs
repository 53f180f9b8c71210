//! dense-collections: open-addressing hash tables for symbol-table and
//! compiler-style workloads, plus the worklists that usually sit next to
//! them.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probing and growth algorithm shared by two storage layouts.
//! - Layers:
//!   - `probe` and `growth`: pure functions. `ProbeSeq` walks a power-of-two
//!     table with triangular steps and visits every bucket exactly once;
//!     `growth::on_insert` decides between writing, doubling, and a
//!     same-size rehash that drops tombstones.
//!   - `DenseMap<K, V, P>` / `DenseSet<K, P>`: keys and values stored inline
//!     in a bucket array. `P: KeyPolicy<K>` supplies hashing and equality.
//!   - `StringMap<V>`: byte-string keys interned once per entry with a
//!     trailing NUL. Entries live in a generational arena; the table keeps
//!     a parallel cache of full hashes so probing rarely touches key bytes.
//!   - `worklist`: FIFO, priority, and unordered worklists.
//!
//! Bucket states
//! - Every bucket is `Empty`, `Tombstone`, or occupied, as an explicit
//!   tag. `KeyPolicy` still names two reserved keys per type; lookups
//!   `debug_assert!` that a caller never passes one, so code written
//!   against sentinel-keyed tables keeps the same contract.
//! - A miss stops at the first empty bucket. Inserts land in the first
//!   tombstone on the probe path, else in that empty bucket.
//!
//! Growth
//! - Before placing a new entry: double when the table would reach 3/4
//!   load; rehash in place when live entries plus tombstones would leave
//!   no more than 1/8 of the buckets empty. Growth never allocates fewer
//!   than `growth::MIN_BUCKETS` buckets.
//! - `DenseMap::clear` reallocates smaller when the table was less than a
//!   quarter full; `StringMap::clear` always resets in place.
//!
//! Handles
//! - `Slot` names a bucket of a `DenseMap` together with the layout epoch
//!   it was taken at. Growth, rehash, clear, and reuse of a tombstone bump
//!   the epoch, so an old slot stops resolving instead of aliasing a moved
//!   or different entry. Erasing one entry leaves other slots valid.
//! - `Handle` names a `StringMap` entry by arena key. Entries never move,
//!   so a handle stays valid across growth until its key is erased.
//!
//! Notes and non-goals
//! - Single-threaded use; the tables are `Send`/`Sync` exactly when their
//!   contents are, and shared mutation needs outside locking.
//! - Iteration visits each live entry once, in bucket order for the tables
//!   and arena order for `StringMap::iter_mut`; no other order is promised.
//! - The crate is entirely safe Rust.

pub mod dense_map;
mod dense_map_proptest;
pub mod dense_set;
pub mod error;
pub mod growth;
pub mod hash;
pub mod key_policy;
pub mod probe;
pub mod slot;
pub mod string_map;
pub mod worklist;

// Public surface
pub use dense_map::DenseMap;
pub use dense_set::DenseSet;
pub use error::Error;
pub use key_policy::{DefaultKeyPolicy, KeyPolicy};
pub use slot::Slot;
pub use string_map::{Handle, StringMap, StringMapEntry};
pub use worklist::{FifoWorkList, PriorityWorkList, UnorderedWorkList};
