//! Shared helpers for reader integration tests.

#![allow(dead_code)]

use uhf_core::{HardwareFamily, RegionCode};
use uhf_reader::{ReaderFacade, ReaderOptions};
use uhf_transport::mock::{MockTransport, MockTransportHandle};

/// Reader in `NotInitialized` backed by a mock transport.
pub fn new_reader(family: HardwareFamily) -> (ReaderFacade, MockTransportHandle) {
    let (transport, handle) = MockTransport::new();
    (ReaderFacade::new(family, transport), handle)
}

/// Reader in `Ready` for `region` with one radio attached.
pub async fn ready_reader(
    region: RegionCode,
    family: HardwareFamily,
) -> (ReaderFacade, MockTransportHandle) {
    let (reader, handle) = new_reader(family);
    reader
        .initialize(ReaderOptions::for_region(region))
        .expect("initialize");
    reader.attach_succeeded(1).await.expect("attach");
    (reader, handle)
}
