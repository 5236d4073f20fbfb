//! Performance benchmarks for capability lookup and validation.
//!
//! Every configuration write looks up the region's capabilities and checks
//! the candidate against them, so both sit on the write path.
//!
//! # Run Benchmarks
//!
//! ```sh
//! cargo bench --bench capability_bench
//!
//! # Compare against a saved baseline
//! cargo bench --bench capability_bench -- --save-baseline before
//! cargo bench --bench capability_bench -- --baseline before
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use uhf_core::{HardwareFamily, RegionCode, capabilities};
use uhf_reader::{OperationConfig, ReaderOptions};

/// Lookup cost across the table, first row to last.
fn bench_capability_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("capability_lookup");
    group.throughput(Throughput::Elements(1));

    let cases = [
        ("first_row", RegionCode::Fcc, HardwareFamily::R2000),
        ("middle_row", RegionCode::Unknown, HardwareFamily::R2000),
        ("last_row", RegionCode::Unknown, HardwareFamily::E710),
    ];

    for (name, region, family) in cases {
        group.bench_with_input(BenchmarkId::new("table", name), &(region, family), |b, &(r, f)| {
            b.iter(|| black_box(capabilities(black_box(r), black_box(f))));
        });
    }

    group.finish();
}

/// Full validation of a candidate, accepted and rejected.
fn bench_config_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_validation");
    group.throughput(Throughput::Elements(1));

    let family = HardwareFamily::E710;
    let valid = OperationConfig::from_options(&ReaderOptions::for_region(RegionCode::Fcc), family)
        .expect("valid options");
    let mut bad_profile = valid.clone();
    bad_profile.link_profile = Some(2);
    let mut bad_power = valid.clone();
    bad_power.power_level = 999;

    let caps = capabilities(RegionCode::Fcc, family).expect("row");

    for (name, config) in [("valid", valid), ("bad_profile", bad_profile), ("bad_power", bad_power)] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(config.validate(black_box(&caps))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_capability_lookup, bench_config_validation);
criterion_main!(benches);
