//! Transport abstraction between the reader control core and the hardware.
//!
//! The control core never talks to USB, serial or TCP links directly. It
//! hands validated configuration changes to a [`ReaderTransport`] and asks it
//! how many radio units are attached. Everything about framing, timeouts and
//! retries belongs to the transport implementation.
//!
//! # Design Philosophy
//!
//! - **Async-first**: transport calls are native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: native async traits are not object-safe, so
//!   [`AnyTransport`] provides concrete dispatch instead of `Box<dyn _>`.
//! - **Thread-safe**: all transports are `Send + Sync` and take `&self`, so a
//!   single instance can serve every caller of the reader façade.
//!
//! # Example
//!
//! ```
//! use uhf_transport::{ConfigField, ConfigurationCommand, ReaderTransport};
//! use uhf_transport::mock::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> uhf_transport::Result<()> {
//!     let (transport, handle) = MockTransport::new();
//!     handle.set_radio_count(2);
//!
//!     assert_eq!(transport.query_attached_radio_count().await?, 2);
//!
//!     let command = ConfigurationCommand::new(0).with_field(ConfigField::PowerLevel(250));
//!     transport.send_configuration_command(&command).await?;
//!     assert_eq!(handle.sent_commands(), vec![command]);
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementation
//!
//! [`mock::MockTransport`] simulates a reader for development and tests,
//! including injected failures and artificial latency.

pub mod devices;
pub mod mock;
pub mod traits;

pub use devices::AnyTransport;
pub use traits::{ConfigField, ConfigurationCommand, ReaderTransport};
pub use uhf_core::TransportError;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
