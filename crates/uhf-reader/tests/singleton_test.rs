//! Process-wide reader instance.
//!
//! Lives in its own test binary so no other test can create the global
//! reader first.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use uhf_core::{HardwareFamily, LifecycleState, RegionCode};
use uhf_reader::{ReaderFacade, ReaderOptions};
use uhf_transport::mock::MockTransport;

const THREADS: usize = 16;

#[test]
fn test_global_reader_constructed_once() {
    assert!(ReaderFacade::global().is_none());

    let constructions = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(std::sync::Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let constructions = Arc::clone(&constructions);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let reader = ReaderFacade::get_or_init(|| {
                    constructions.fetch_add(1, Ordering::SeqCst);
                    let (transport, _handle) = MockTransport::new();
                    ReaderFacade::new(HardwareFamily::E710, transport)
                });
                reader as *const ReaderFacade as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));

    let global = ReaderFacade::global().unwrap();
    assert_eq!(global as *const ReaderFacade as usize, addresses[0]);
    assert_eq!(global.hardware_family(), HardwareFamily::E710);

    // Later initializers are ignored
    let again = ReaderFacade::get_or_init(|| {
        let (transport, _handle) = MockTransport::new();
        ReaderFacade::new(HardwareFamily::R2000, transport)
    });
    assert_eq!(again.hardware_family(), HardwareFamily::E710);

    // The shared instance is usable from any thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        global.initialize(ReaderOptions::for_region(RegionCode::Cn)).unwrap();
        tokio::spawn(async { ReaderFacade::global().unwrap().attach().await })
            .await
            .unwrap()
            .unwrap();
    });
    assert_eq!(global.state(), LifecycleState::Ready);
}
