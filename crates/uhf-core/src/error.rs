//! Error types for reader control operations.
//!
//! [`ReaderError`] is the single discriminated error returned across the
//! reader façade. [`TransportError`] describes failures reported by the
//! hardware transport; it is folded into [`ReaderError::TransportFault`].

use crate::types::LifecycleState;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors returned by reader control operations.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// A configuration value falls outside what the current region allows.
    ///
    /// The configuration is left unchanged.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The operation is not permitted in the current lifecycle state.
    #[error(
        "Illegal state transition: reader is {current}, operation requires one of [{}]",
        join_states(.required)
    )]
    IllegalStateTransition {
        current: LifecycleState,
        required: Vec<LifecycleState>,
    },

    /// The region code is not recognized.
    #[error("Invalid region: {code}")]
    InvalidRegion { code: String },

    /// The hardware transport failed; the reader has moved to `Error`.
    #[error("Transport fault: {0}")]
    TransportFault(#[from] TransportError),
}

impl ReaderError {
    /// Create a new validation error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Create a new illegal state transition error.
    pub fn illegal_state(current: LifecycleState, required: &[LifecycleState]) -> Self {
        Self::IllegalStateTransition {
            current,
            required: required.to_vec(),
        }
    }

    /// Create a new invalid region error.
    pub fn invalid_region(code: impl Into<String>) -> Self {
        Self::InvalidRegion { code: code.into() }
    }

    /// True for errors that leave the reader usable without re-initialization.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::TransportFault(_))
    }
}

fn join_states(states: &[LifecycleState]) -> String {
    states
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors reported by the hardware transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Reader is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Command was not acknowledged in time.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Link-level communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The reader answered but refused the command.
    #[error("Command rejected: {message}")]
    Rejected { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new rejected command error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
