//! Control core of a UHF RFID reader.
//!
//! This crate keeps a reader's operating configuration valid for its
//! regulatory region and hardware family, gates configuration changes on the
//! reader lifecycle, and pushes every committed change to the hardware
//! through a [`uhf_transport::ReaderTransport`].
//!
//! # Components
//!
//! - [`lifecycle`]: state machine from power-up to shutdown, with history
//! - [`store`]: the validated configuration record and its atomic updates
//! - [`facade`]: the thread-safe entry point tying both to a transport
//! - [`events`]: notifications delivered after each operation
//! - [`config`]: session start-up options
//!
//! # Thread Safety
//!
//! [`ReaderFacade`] is `Send + Sync` and takes `&self` everywhere. One
//! process-wide instance is available through [`ReaderFacade::get_or_init`];
//! tests and embedders can create independent handles with
//! [`ReaderFacade::new`].
//!
//! # Example
//!
//! ```
//! use uhf_core::{HardwareFamily, RegionCode};
//! use uhf_reader::{ReaderFacade, ReaderOptions};
//! use uhf_transport::mock::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> uhf_core::Result<()> {
//!     let (transport, _handle) = MockTransport::new();
//!     let reader = ReaderFacade::new(HardwareFamily::R2000, transport);
//!
//!     reader.initialize(ReaderOptions::for_region(RegionCode::Etsi))?;
//!     reader.attach_succeeded(1).await?;
//!
//!     // ETSI caps R2000 power at 27.5 dBm
//!     assert_eq!(reader.configuration().power_level, 275);
//!     assert!(reader.set_power_level(300).await.is_err());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod events;
pub mod facade;
pub mod lifecycle;
pub mod store;

pub use config::ReaderOptions;
pub use events::{CompletionSink, ReaderEvent, event_channel};
pub use facade::ReaderFacade;
pub use lifecycle::{LifecycleEvent, LifecycleStateMachine, StateTransition};
pub use store::{ConfigurationStore, OperationConfig, RegionChange, StaleSnapshot, Validated};

// Re-export the vocabulary callers need alongside the façade
pub use uhf_core::{
    Capabilities, HardwareFamily, LifecycleState, OperationMode, RadioAttachment, ReaderError,
    RegionCode, Result, Singulation,
};
