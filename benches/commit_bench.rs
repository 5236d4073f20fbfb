//! Performance benchmarks for the configuration write path.
//!
//! `prepare` runs without the reader lock and `commit` runs under it, so
//! `commit` bounds how long writers block each other.
//!
//! ```sh
//! cargo bench --bench commit_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use uhf_core::{HardwareFamily, RegionCode};
use uhf_reader::{ConfigurationStore, ReaderOptions, RegionChange};

fn store() -> ConfigurationStore {
    ConfigurationStore::from_options(&ReaderOptions::for_region(RegionCode::Fcc), HardwareFamily::R2000)
        .expect("valid options")
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");
    group.throughput(Throughput::Elements(1));

    let store = store();
    let base = store.snapshot();

    group.bench_function("power_level", |b| {
        b.iter(|| {
            black_box(ConfigurationStore::prepare(&base, 0, HardwareFamily::R2000, RegionChange::Strict, |mut c| {
                c.power_level = black_box(250);
                c
            }))
        });
    });

    group.bench_function("region_change", |b| {
        b.iter(|| {
            black_box(ConfigurationStore::prepare(&base, 0, HardwareFamily::R2000, RegionChange::Normalize, |mut c| {
                c.region = black_box(RegionCode::Etsi);
                c
            }))
        });
    });

    group.finish();
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_replace", |b| {
        let mut store = store();
        let mut level = 0u16;
        b.iter(|| {
            level = (level + 1) % 300;
            black_box(store.try_replace(RegionChange::Strict, |mut c| {
                c.power_level = level;
                c
            }))
        });
    });

    group.bench_function("changes_from", |b| {
        let store = store();
        let before = store.snapshot();
        let mut after = before.clone();
        after.power_level = 100;
        after.lbt_enabled = true;
        b.iter(|| black_box(after.changes_from(black_box(Some(&before)))));
    });

    group.finish();
}

criterion_group!(benches, bench_prepare, bench_commit);
criterion_main!(benches);
