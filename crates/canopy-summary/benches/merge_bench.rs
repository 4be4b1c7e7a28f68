//! Criterion benchmarks for canopy-summary: set construction and merging.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use canopy_data::{Column, FeatureTable, IndexView};
use canopy_summary::{BaggingConfig, SummarySet};

fn make_table(n_rows: usize, n_continuous: usize, seed: u64) -> FeatureTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut names = Vec::with_capacity(n_continuous + 1);
    let mut columns = Vec::with_capacity(n_continuous + 1);
    for f in 0..n_continuous {
        names.push(format!("f{f}"));
        columns.push(Column::Continuous(
            (0..n_rows).map(|_| rng.r#gen::<f64>() * 10.0).collect(),
        ));
    }
    names.push("label".to_string());
    columns.push(Column::Discrete {
        values: (0..n_rows).map(|_| rng.gen_range(0..5)).collect(),
        categories: 5,
    });
    FeatureTable::new(names, columns).unwrap()
}

fn bench_set_build(c: &mut Criterion) {
    let table = make_table(1000, 20, 42);
    let rows = IndexView::all(1000);

    c.bench_function("set_build_1000x21", |b| {
        b.iter(|| SummarySet::new(&table, &rows, None).unwrap());
    });
}

fn bench_merge_many(c: &mut Criterion) {
    let table = make_table(1000, 20, 42);
    let store = BaggingConfig::new(200)
        .unwrap()
        .with_seed(42)
        .fit(&table)
        .unwrap()
        .into_store();
    let sets = store.sets();

    c.bench_function("merge_many_20x10_sets_21_features", |b| {
        b.iter(|| SummarySet::merge_many(20, 10, sets).unwrap());
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let table = make_table(1000, 20, 42);
    let codes = Some("BNGGGGGGGGGGGGGGGGGGC");
    let set = SummarySet::new(&table, &IndexView::all(1000), codes).unwrap();

    c.bench_function("set_encode_decode_21_features", |b| {
        b.iter(|| SummarySet::from_bytes(&set.to_bytes()).unwrap());
    });
}

criterion_group!(benches, bench_set_build, bench_merge_many, bench_round_trip);
criterion_main!(benches);
