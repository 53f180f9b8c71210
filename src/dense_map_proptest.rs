#![cfg(test)]

// Property tests for DenseMap kept inside the crate so the colliding policy
// and the model comparison can reach crate-private helpers if needed.

use crate::dense_map::DenseMap;
use crate::key_policy::{DefaultKeyPolicy, KeyPolicy};
use crate::slot::Slot;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::BTreeSet;

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertOrAssign(usize, i32),
    EmplaceWith(usize, i32),
    Erase(usize),
    EraseSlot(usize),
    Get(usize),
    Mutate(usize, i32),
    Retain(u32),
    Reserve(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::vec(0u32..100_000, 1..=300).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        // Clears and retains are rare so tables get past the growth floor.
        let op = prop_oneof![
            60 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            20 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertOrAssign(i, v)),
            20 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::EmplaceWith(i, v)),
            25 => idx.clone().prop_map(Op::Erase),
            10 => idx.clone().prop_map(Op::EraseSlot),
            30 => idx.clone().prop_map(Op::Get),
            15 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            2 => (2u32..5).prop_map(Op::Retain),
            2 => (0usize..400).prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            5 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..800).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against hashbrown::HashMap. Checked after every
// operation:
// - `len`/`is_empty` parity and `occupied + tombstoned <= num_buckets`.
// - Every slot whose entry was erased, or taken before a layout change,
//   never resolves again; erasing one entry leaves other slots valid.
// - Iteration yields each live entry exactly once, counted by walking it.
// - `insert` keeps the stored value, `insert_or_assign` replaces it, and the
//   lazy constructor runs only for new keys.
fn run_scenario<P: KeyPolicy<u32>>(pool: &[u32], ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut sut: DenseMap<u32, i32, P> = DenseMap::new();
    let mut model: HashMap<u32, i32> = HashMap::new();
    let mut stale: Vec<Slot> = Vec::new();
    let calls = Cell::new(0);

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i];
                let (slot, inserted) = sut.insert(k, v);
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(v);
                prop_assert_eq!(slot.key(&sut), Some(&k));
                prop_assert_eq!(slot.value(&sut), model.get(&k));
            }
            Op::InsertOrAssign(i, v) => {
                let k = pool[i];
                let (_, inserted) = sut.insert_or_assign(k, v);
                prop_assert_eq!(inserted, model.insert(k, v).is_none());
            }
            Op::EmplaceWith(i, v) => {
                let k = pool[i];
                let before = calls.get();
                let (_, inserted) = sut.try_emplace_with(k, || {
                    calls.set(calls.get() + 1);
                    v
                });
                let expect_new = !model.contains_key(&k);
                prop_assert_eq!(inserted, expect_new);
                prop_assert_eq!(calls.get(), before + usize::from(expect_new));
                model.entry(k).or_insert(v);
            }
            Op::Erase(i) => {
                let k = pool[i];
                let slot = sut.find_slot(&k);
                let neighbour = model
                    .keys()
                    .find(|&&other| other != k)
                    .copied()
                    .and_then(|other| sut.find_slot(&other).map(|s| (other, s)));
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                stale.extend(slot);
                if let Some((other, s)) = neighbour {
                    prop_assert_eq!(s.key(&sut), Some(&other));
                }
            }
            Op::EraseSlot(i) => {
                let k = pool[i];
                match sut.find_slot(&k) {
                    Some(slot) => {
                        let (kk, vv) = sut.erase_slot(slot).unwrap();
                        prop_assert_eq!(kk, k);
                        prop_assert_eq!(Some(vv), model.remove(&k));
                        prop_assert!(sut.erase_slot(slot).is_none());
                        stale.push(slot);
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            Op::Get(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.count(&k), usize::from(model.contains_key(&k)));
            }
            Op::Mutate(i, d) => {
                let k = pool[i];
                if let Some(slot) = sut.find_slot(&k) {
                    let v = slot.value_mut(&mut sut).unwrap();
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(&k).unwrap();
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::Retain(m) => {
                let (dropped, kept): (Vec<u32>, Vec<u32>) =
                    model.keys().copied().partition(|k| k % m == 0);
                let kept_slots: Vec<(u32, Slot)> = kept
                    .iter()
                    .filter_map(|k| sut.find_slot(k).map(|s| (*k, s)))
                    .collect();
                stale.extend(dropped.iter().filter_map(|k| sut.find_slot(k)));
                sut.retain(|k, _| k % m != 0);
                model.retain(|k, _| k % m != 0);
                // Retain moves nothing, so survivors keep their slots.
                for (k, s) in kept_slots {
                    prop_assert_eq!(s.key(&sut), Some(&k));
                }
            }
            Op::Reserve(n) => {
                let buckets = sut.num_buckets();
                sut.reserve(n);
                prop_assert!(sut.num_buckets() >= buckets);
                // Filling up to the reserved size must not grow again.
                let reserved = sut.num_buckets();
                prop_assert!(n == 0 || n * 4 < reserved * 3);
            }
            Op::Clear => {
                stale.extend(model.keys().filter_map(|k| sut.find_slot(k)));
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.num_tombstones(), 0);
            }
            Op::Iterate => {
                let yielded: Vec<(u32, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(yielded.len(), model.len());
                prop_assert_eq!(sut.iter_slots().count(), model.len());
                let s: BTreeSet<(u32, i32)> = yielded.into_iter().collect();
                let m: BTreeSet<(u32, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(s.len(), model.len());
                prop_assert_eq!(s, m);
            }
        }

        for slot in &stale {
            prop_assert!(slot.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() + sut.num_tombstones() <= sut.num_buckets());
        prop_assert!(sut.num_buckets() == 0 || sut.num_buckets().is_power_of_two());
    }
    Ok(())
}

// Every key hashes to bucket 0, so every lookup walks the full collision
// chain and tombstone reuse is exercised on each erase/insert pair.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario::<DefaultKeyPolicy>(&pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario::<Colliding>(&pool, ops)?;
    }

    // Growth transparency: a few hundred distinct keys with erases mixed in
    // push the table through several doublings; no live key is lost and
    // none is yielded twice.
    #[test]
    fn prop_growth_with_interleaved_erases(
        keys in proptest::collection::hash_set(0u32..1_000_000, 150..=400),
        erase_every in 2usize..6,
    ) {
        let mut sut: DenseMap<u32, u32> = DenseMap::new();
        let mut model: HashMap<u32, u32> = HashMap::new();
        let keys: Vec<u32> = keys.into_iter().collect();
        for (i, &k) in keys.iter().enumerate() {
            prop_assert!(sut.insert(k, i as u32).1);
            model.insert(k, i as u32);
            if i % erase_every == 0 {
                let victim = keys[i / 2];
                prop_assert_eq!(sut.remove(&victim), model.remove(&victim));
            }
        }
        prop_assert!(sut.num_buckets() > crate::growth::MIN_BUCKETS);
        let yielded: Vec<u32> = sut.keys().copied().collect();
        prop_assert_eq!(yielded.len(), model.len());
        let distinct: BTreeSet<u32> = yielded.into_iter().collect();
        prop_assert_eq!(distinct.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }
    }
}
