//! Notifications emitted by the reader façade.
//!
//! The façade never calls back into application code while it holds its
//! lock. Events are collected during an operation and handed to the
//! [`CompletionSink`] after the lock is released, so a sink may call the
//! façade again without deadlocking.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;
use uhf_core::constants::DEFAULT_EVENT_CAPACITY;
use uhf_transport::ConfigField;

use crate::lifecycle::StateTransition;
use crate::store::OperationConfig;

/// Something observable happened inside the reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
#[non_exhaustive]
pub enum ReaderEvent {
    /// The lifecycle moved to a new state.
    StateChanged(StateTransition),

    /// A new configuration was committed.
    ConfigurationChanged {
        config: OperationConfig,
        revision: u64,
    },

    /// The transport accepted a configuration command.
    ConfigurationApplied { radio: u8, fields: Vec<ConfigField> },

    /// The transport failed and the reader moved to `Error`.
    TransportFault { message: String },
}

impl ReaderEvent {
    /// Short event name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChanged(_) => "state_changed",
            Self::ConfigurationChanged { .. } => "configuration_changed",
            Self::ConfigurationApplied { .. } => "configuration_applied",
            Self::TransportFault { .. } => "transport_fault",
        }
    }
}

/// Receiver of reader events.
///
/// `deliver` is called outside the façade's lock and must not block; a sink
/// that cannot keep up should drop events.
pub trait CompletionSink: Send + Sync {
    fn deliver(&self, event: ReaderEvent);
}

impl CompletionSink for mpsc::Sender<ReaderEvent> {
    fn deliver(&self, event: ReaderEvent) {
        let name = event.name();
        if let Err(error) = self.try_send(event) {
            trace!(event = name, "event dropped: {}", error);
        }
    }
}

impl CompletionSink for mpsc::UnboundedSender<ReaderEvent> {
    fn deliver(&self, event: ReaderEvent) {
        let name = event.name();
        if self.send(event).is_err() {
            trace!(event = name, "event dropped: receiver closed");
        }
    }
}

/// Bounded event channel with the default capacity.
pub fn event_channel() -> (mpsc::Sender<ReaderEvent>, mpsc::Receiver<ReaderEvent>) {
    mpsc::channel(DEFAULT_EVENT_CAPACITY)
}
