use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dense_collections::{Handle, StringMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (StringMap<u64>, Vec<String>) {
    let mut m = StringMap::with_capacity(n);
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.try_emplace(k, i as u64);
    }
    (m, keys)
}

fn bench_intern_fresh_100k(c: &mut Criterion) {
    c.bench_function("string::intern_fresh_100k", |b| {
        let keys: Vec<String> = lcg(1).take(100_000).map(key).collect();
        b.iter_batched(
            StringMap::<u64>::new,
            |mut m| {
                for (i, k) in keys.iter().enumerate() {
                    m.try_emplace(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

// Re-interning keys that are already present: the common case for a
// symbol table fed from a token stream.
fn bench_intern_existing_100k(c: &mut Criterion) {
    c.bench_function("string::intern_existing_100k", |b| {
        let (mut m, keys) = filled(2, 100_000);
        b.iter(|| {
            for k in &keys {
                black_box(m.try_emplace(k, 0));
            }
        })
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("string::find_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("string::find_miss_10k_on_100k", |b| {
        let (m, _) = filled(11, 100_000);
        let misses: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
        b.iter(|| {
            for k in &misses {
                black_box(m.find(k));
            }
        })
    });
}

fn bench_erase_handles_10k(c: &mut Criterion) {
    c.bench_function("string::erase_handle_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                let victims: Vec<Handle> =
                    keys.iter().step_by(11).filter_map(|k| m.find(k)).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for h in victims {
                    black_box(m.erase_handle(h));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter(c: &mut Criterion) {
    c.bench_function("string::iter_all_100k", |b| {
        let (m, _) = filled(999, 100_000);
        b.iter(|| {
            let mut total = 0usize;
            for (_, e) in m.iter() {
                total = total.wrapping_add(e.key_len());
            }
            black_box(total)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_intern_fresh_100k, bench_intern_existing_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_find_hit_10k,
              bench_find_miss_10k,
              bench_erase_handles_10k,
              bench_iter
}
criterion_main!(benches_insert, benches_ops);
