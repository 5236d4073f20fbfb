//! Mock reader transport for testing and development.
//!
//! This module provides a simulated reader link that records every command it
//! receives and can be told to fail or to respond slowly, without requiring
//! physical hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::{
    Result, TransportError,
    traits::{ConfigurationCommand, ReaderTransport},
};

/// Mock reader transport.
///
/// Shares its state with a [`MockTransportHandle`] through which tests
/// configure the simulated reader and inspect the commands it received.
///
/// # Examples
///
/// ```
/// use uhf_transport::{ConfigField, ConfigurationCommand, ReaderTransport, TransportError};
/// use uhf_transport::mock::MockTransport;
///
/// #[tokio::main]
/// async fn main() {
///     let (transport, handle) = MockTransport::new();
///
///     // Make the next command fail
///     handle.fail_next_send(TransportError::timeout(500));
///
///     let command = ConfigurationCommand::new(0).with_field(ConfigField::PowerLevel(200));
///     assert!(transport.send_configuration_command(&command).await.is_err());
///     assert!(transport.send_configuration_command(&command).await.is_ok());
///     assert_eq!(handle.sent_count(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    name: String,
    radio_count: u8,
    connected: bool,
    latency: Option<Duration>,
    send_failures: VecDeque<TransportError>,
    query_failure: Option<TransportError>,
    sent: Vec<ConfigurationCommand>,
}

impl MockTransport {
    /// Create a new mock transport with one attached radio.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle controls the simulated reader.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock UHF Reader")
    }

    /// Create a new mock transport with a custom device name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let shared = Arc::new(Mutex::new(MockState {
            name: name.into(),
            radio_count: 1,
            connected: true,
            latency: None,
            send_failures: VecDeque::new(),
            query_failure: None,
            sent: Vec::new(),
        }));

        let transport = Self {
            shared: Arc::clone(&shared),
        };
        (transport, MockTransportHandle { shared })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }

    async fn simulate_latency(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl ReaderTransport for MockTransport {
    async fn send_configuration_command(&self, command: &ConfigurationCommand) -> Result<()> {
        self.simulate_latency().await;

        let mut state = self.state();
        if !state.connected {
            return Err(TransportError::disconnected(state.name.clone()));
        }
        if let Some(error) = state.send_failures.pop_front() {
            debug!(radio = command.radio, "mock transport failing command: {}", error);
            return Err(error);
        }

        trace!(
            radio = command.radio,
            fields = %command.field_names(),
            "mock transport accepted command"
        );
        state.sent.push(command.clone());
        Ok(())
    }

    async fn query_attached_radio_count(&self) -> Result<u8> {
        self.simulate_latency().await;

        let mut state = self.state();
        if !state.connected {
            return Err(TransportError::disconnected(state.name.clone()));
        }
        if let Some(error) = state.query_failure.take() {
            return Err(error);
        }
        Ok(state.radio_count)
    }
}

/// Handle for controlling a mock transport.
///
/// Clones share the same simulated reader.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    shared: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }

    /// Number of radio units the reader reports.
    pub fn set_radio_count(&self, count: u8) {
        self.state().radio_count = count;
    }

    /// Delay applied to every transport call.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    /// Queue an error for the next `send_configuration_command` call.
    ///
    /// Queued errors are consumed one per call, in order.
    pub fn fail_next_send(&self, error: TransportError) {
        self.state().send_failures.push_back(error);
    }

    /// Make the next radio count query fail.
    pub fn fail_next_query(&self, error: TransportError) {
        self.state().query_failure = Some(error);
    }

    /// Simulate unplugging the reader; every call fails until reconnected.
    pub fn disconnect(&self) {
        self.state().connected = false;
    }

    pub fn reconnect(&self) {
        self.state().connected = true;
    }

    /// Commands accepted so far, oldest first.
    pub fn sent_commands(&self) -> Vec<ConfigurationCommand> {
        self.state().sent.clone()
    }

    pub fn last_command(&self) -> Option<ConfigurationCommand> {
        self.state().sent.last().cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.state().sent.len()
    }

    pub fn clear_sent(&self) {
        self.state().sent.clear();
    }

    /// Get the device name.
    pub fn name(&self) -> String {
        self.state().name.clone()
    }
}

// A panic while holding the mock's lock cannot leave the state half-written.
fn lock(shared: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ConfigField;

    fn power_command(level: u16) -> ConfigurationCommand {
        ConfigurationCommand::new(0).with_field(ConfigField::PowerLevel(level))
    }

    #[tokio::test]
    async fn test_mock_transport_records_commands() {
        let (transport, handle) = MockTransport::new();

        transport
            .send_configuration_command(&power_command(100))
            .await
            .unwrap();
        transport
            .send_configuration_command(&power_command(200))
            .await
            .unwrap();

        assert_eq!(handle.sent_count(), 2);
        assert_eq!(handle.last_command(), Some(power_command(200)));

        handle.clear_sent();
        assert_eq!(handle.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_transport_default_radio_count() {
        let (transport, _handle) = MockTransport::new();
        assert_eq!(transport.query_attached_radio_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_queued_failures_in_order() {
        let (transport, handle) = MockTransport::new();
        handle.fail_next_send(TransportError::timeout(100));
        handle.fail_next_send(TransportError::rejected("busy"));

        let first = transport.send_configuration_command(&power_command(1)).await;
        assert!(matches!(first, Err(TransportError::Timeout { .. })));

        let second = transport.send_configuration_command(&power_command(1)).await;
        assert!(matches!(second, Err(TransportError::Rejected { .. })));

        assert!(transport.send_configuration_command(&power_command(1)).await.is_ok());
        assert_eq!(handle.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_query_failure_is_one_shot() {
        let (transport, handle) = MockTransport::new();
        handle.fail_next_query(TransportError::communication("no answer"));

        assert!(transport.query_attached_radio_count().await.is_err());
        assert!(transport.query_attached_radio_count().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_transport_disconnect() {
        let (transport, handle) = MockTransport::with_name("usb0");
        handle.disconnect();

        let result = transport.query_attached_radio_count().await;
        assert!(matches!(result, Err(TransportError::Disconnected { ref device }) if device == "usb0"));

        handle.reconnect();
        assert!(transport.query_attached_radio_count().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_transport_latency() {
        let (transport, handle) = MockTransport::new();
        handle.set_latency(Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        transport.query_attached_radio_count().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn test_mock_handle_clone_shares_state() {
        let (_transport, handle) = MockTransport::new();
        let clone = handle.clone();
        clone.set_radio_count(4);
        assert_eq!(handle.state().radio_count, 4);
        assert_eq!(handle.name(), "Mock UHF Reader");
    }
}
