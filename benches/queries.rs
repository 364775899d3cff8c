#[macro_use]
extern crate criterion;

use std::ops::Range;

use criterion::Criterion;
use criterion::black_box;

use rand::prelude::*;
use rand::rngs::SmallRng;

use rusting_bitsets::Bitset;

const SEED0: u64 = 0x0304_0106_0308_0600;
const SEED1: u64 = 0x0905_0407_0608_0102;

const LARGE: usize = 5_000_000;
const SMALL: usize = 200_000;

fn generate_seeded_data(range: Range<usize>, count: usize, seed: u64) -> Vec<usize> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut result: Vec<usize> = (0..count)
        .map(|_| rng.gen_range(range.clone()))
        .collect();

    result.sort_unstable();
    result.dedup();

    result
}

fn make_bitset(capacity: usize, data: &[usize]) -> Bitset {
    let mut bitset = Bitset::new(capacity).unwrap();
    for value in data {
        bitset.set(*value).unwrap();
    }

    bitset
}

fn setup(capacity: usize, count: usize) -> (Bitset, Bitset) {
    let data_a = generate_seeded_data(0..capacity, count, SEED0);
    let data_b = generate_seeded_data(0..capacity, count, SEED1);

    (make_bitset(capacity, &data_a), make_bitset(capacity, &data_b))
}

fn duplicate_large(c: &mut Criterion) {
    let (a, _) = setup(LARGE, LARGE / 2);

    c.bench_function("bitset duplicate - large", move |bencher| {
        bencher.iter_with_large_drop(|| a.duplicate().unwrap())
    });
}

fn query_large(c: &mut Criterion) {
    let (a, _) = setup(LARGE, LARGE / 2);
    let writes = generate_seeded_data(0..LARGE, 32, SEED1);

    // One duplicate per query followed by a handful of sparse writes
    c.bench_function("bitset sparse query - large", move |bencher| {
        bencher.iter_with_large_drop(|| {
            let mut view = a.duplicate().unwrap();
            for value in &writes {
                view.toggle(*value).unwrap();
            }

            black_box(view.cardinality());
            view
        })
    });
}

fn union_large(c: &mut Criterion) {
    let (a, b) = setup(LARGE, LARGE / 2);

    c.bench_function("bitset union - large", move |bencher| {
        bencher.iter_with_large_drop(|| a.union(&b).unwrap())
    });
}

fn intersection_large(c: &mut Criterion) {
    let (a, b) = setup(LARGE, LARGE / 2);

    c.bench_function("bitset intersection - large", move |bencher| {
        bencher.iter_with_large_drop(|| a.intersection(&b).unwrap())
    });
}

fn complement_large(c: &mut Criterion) {
    let (a, _) = setup(LARGE, LARGE / 2);

    c.bench_function("bitset complement - large", move |bencher| {
        bencher.iter_with_large_drop(|| a.complement().unwrap())
    });
}

fn union_sparse(c: &mut Criterion) {
    let (a, b) = setup(SMALL, SMALL / 100);

    c.bench_function("bitset union - sparse", move |bencher| {
        bencher.iter_with_large_drop(|| a.union(&b).unwrap())
    });
}

fn difference_sparse(c: &mut Criterion) {
    let (a, b) = setup(SMALL, SMALL / 100);

    c.bench_function("bitset difference - sparse", move |bencher| {
        bencher.iter_with_large_drop(|| a.difference(&b).unwrap())
    });
}

fn inplace_union_sparse(c: &mut Criterion) {
    let (a, b) = setup(SMALL, SMALL / 100);

    c.bench_function("bitset inplace union - sparse", move |bencher| {
        bencher.iter_with_large_drop(|| {
            let mut result = a.duplicate().unwrap();
            result.union_with(&b).unwrap();
            result
        })
    });
}

criterion_group!(bitset_large, duplicate_large, query_large, union_large, intersection_large, complement_large);
criterion_group!(bitset_sparse, union_sparse, difference_sparse, inplace_union_sparse);

criterion_main!(bitset_large, bitset_sparse);
