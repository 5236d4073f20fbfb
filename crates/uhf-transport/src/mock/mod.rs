//! Mock transport implementations for testing and development.
//!
//! This module provides a simulated reader link that can be controlled
//! programmatically without requiring physical hardware.

pub mod transport;

// Re-export commonly used types
pub use transport::{MockTransport, MockTransportHandle};
