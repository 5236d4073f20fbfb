//! Core types shared by the UHF reader control crates.
//!
//! This crate holds the domain vocabulary (region codes, hardware families,
//! lifecycle states), the error taxonomy, and the regional capability table
//! that every configuration write is validated against.

pub mod constants;
pub mod error;
pub mod region;
pub mod types;

pub use error::{ReaderError, Result, TransportError};
pub use region::{Capabilities, ChannelPlan, capabilities};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
