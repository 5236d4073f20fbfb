//! Property-based tests for configuration invariants.
//!
//! Random sequences of configuration writes, applied one at a time and from
//! concurrent tasks, must never expose a configuration that violates its
//! region's capabilities.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use uhf_core::{HardwareFamily, RegionCode, Result, Singulation, capabilities};
use uhf_reader::{OperationConfig, ReaderFacade};

/// One configuration write.
#[derive(Debug, Clone)]
enum Write {
    Region(RegionCode),
    Power(u16),
    Profile(u16),
    Channel(u8),
    Fixed(bool),
    Lbt(bool),
    Q(u8),
    Duration(u32),
    PowerAndProfile(u16, u16),
}

fn any_region() -> impl Strategy<Value = RegionCode> {
    prop::sample::select(RegionCode::ALL.to_vec())
}

fn any_family() -> impl Strategy<Value = HardwareFamily> {
    prop_oneof![Just(HardwareFamily::R2000), Just(HardwareFamily::E710)]
}

/// Writes spanning both legal and illegal values.
fn any_write() -> impl Strategy<Value = Write> {
    prop_oneof![
        any_region().prop_map(Write::Region),
        (0u16..400).prop_map(Write::Power),
        (0u16..20).prop_map(Write::Profile),
        (0u8..60).prop_map(Write::Channel),
        any::<bool>().prop_map(Write::Fixed),
        any::<bool>().prop_map(Write::Lbt),
        (0u8..20).prop_map(Write::Q),
        (0u32..70_000).prop_map(Write::Duration),
        ((0u16..400), (0u16..20)).prop_map(|(p, l)| Write::PowerAndProfile(p, l)),
    ]
}

async fn apply(reader: &ReaderFacade, write: &Write) -> Result<OperationConfig> {
    match *write {
        Write::Region(region) => reader.set_region(region).await,
        Write::Power(level) => reader.set_power_level(level).await,
        Write::Profile(profile) => reader.set_link_profile(profile).await,
        Write::Channel(channel) => reader.set_channel(channel).await,
        Write::Fixed(fixed) => reader.set_fixed_channel(fixed).await,
        Write::Lbt(enabled) => reader.set_lbt_enabled(enabled).await,
        Write::Q(q) => reader.set_singulation(Singulation::DynamicQ { start_q: q }).await,
        Write::Duration(ms) => {
            reader
                .set_inventory_duration(Duration::from_millis(u64::from(ms)), 0)
                .await
        }
        Write::PowerAndProfile(level, profile) => {
            reader
                .update(move |mut config| {
                    config.power_level = level;
                    config.link_profile = Some(profile);
                    config
                })
                .await
        }
    }
}

fn check_invariants(config: &OperationConfig, family: HardwareFamily) -> std::result::Result<(), TestCaseError> {
    let caps = capabilities(config.region, family)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    prop_assert!(config.validate(&caps).is_ok(), "invalid snapshot: {:?}", config);
    prop_assert_eq!(config.link_profile.is_none(), config.region == RegionCode::Unknown);
    prop_assert_eq!(config.selected_frequency_khz(), caps.channel_plan.frequency_khz(config.channel));
    Ok(())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    /// Property: every write either commits a valid configuration or
    /// leaves the configuration exactly as it was.
    #[test]
    fn prop_writes_are_atomic_and_valid(
        family in any_family(),
        region in any_region(),
        writes in prop::collection::vec(any_write(), 1..40),
    ) {
        let rt = runtime();
        let result: std::result::Result<(), TestCaseError> = rt.block_on(async move {
            let (reader, handle) = common::ready_reader(region, family).await;
            check_invariants(&reader.configuration(), family)?;

            for write in &writes {
                let before = reader.configuration();
                let sent_before = handle.sent_count();

                match apply(&reader, write).await {
                    Ok(committed) => {
                        prop_assert_eq!(&committed, &reader.configuration());
                        prop_assert!(reader.is_synchronized());
                    }
                    Err(error) => {
                        prop_assert!(error.is_recoverable(), "{}", error);
                        prop_assert_eq!(&before, &reader.configuration());
                        prop_assert_eq!(sent_before, handle.sent_count());
                    }
                }
                check_invariants(&reader.configuration(), family)?;
            }
            Ok(())
        });
        result?;
    }

    /// Property: power above the regional ceiling is always rejected.
    #[test]
    fn prop_power_above_ceiling_rejected(
        family in any_family(),
        region in any_region(),
        excess in 1u16..200,
    ) {
        let caps = capabilities(region, family).unwrap();
        let rt = runtime();
        let result: std::result::Result<(), TestCaseError> = rt.block_on(async move {
            let (reader, _handle) = common::ready_reader(region, family).await;
            let before = reader.configuration();

            prop_assert!(reader.set_power_level(caps.max_power_level + excess).await.is_err());
            prop_assert_eq!(before, reader.configuration());
            Ok(())
        });
        result?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: concurrent writers and readers never observe an invalid
    /// configuration, and the final state matches the hardware.
    #[test]
    fn prop_concurrent_writers_preserve_invariants(
        family in any_family(),
        region in any_region(),
        workers in prop::collection::vec(prop::collection::vec(any_write(), 1..20), 2..6),
    ) {
        let rt = runtime();
        let (reader, handle) = rt.block_on(common::ready_reader(region, family));
        let reader = Arc::new(reader);

        // Plain threads sampling snapshots while the writers run
        let stop = Arc::new(AtomicBool::new(false));
        let observers: Vec<_> = (0..2)
            .map(|_| {
                let reader = Arc::clone(&reader);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    let mut snapshots = Vec::new();
                    while !stop.load(Ordering::Relaxed) {
                        snapshots.push(reader.configuration());
                        thread::yield_now();
                    }
                    snapshots
                })
            })
            .collect();

        rt.block_on(async {
            let tasks: Vec<_> = workers
                .into_iter()
                .map(|writes| {
                    let reader = Arc::clone(&reader);
                    tokio::spawn(async move {
                        for write in &writes {
                            let _ = apply(&reader, write).await;
                        }
                    })
                })
                .collect();
            for task in tasks {
                task.await.expect("writer panicked");
            }
        });

        stop.store(true, Ordering::Relaxed);
        for observer in observers {
            for snapshot in observer.join().expect("observer panicked") {
                check_invariants(&snapshot, family)?;
            }
        }

        let last = reader.configuration();
        check_invariants(&last, family)?;
        prop_assert!(reader.is_synchronized());

        // Replaying every command on top of each other reproduces the final state
        let mut replayed = None;
        for command in handle.sent_commands() {
            for field in command.fields {
                if let uhf_transport::ConfigField::Region(region) = field {
                    replayed = Some(region);
                }
            }
        }
        prop_assert_eq!(replayed, Some(last.region));
    }
}
