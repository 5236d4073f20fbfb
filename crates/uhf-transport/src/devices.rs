//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits (RPITIT) are not object-safe, so we cannot
//! hold a `Box<dyn ReaderTransport>`. [`AnyTransport`] gives concrete type
//! dispatch instead, which also lets the compiler prove the returned futures
//! are `Send` so façade calls can be spawned on a multi-threaded runtime.
//!
//! # Examples
//!
//! ```
//! use uhf_transport::AnyTransport;
//! use uhf_transport::mock::MockTransport;
//!
//! let (transport, _handle) = MockTransport::new();
//! let any: AnyTransport = transport.into();
//! assert_eq!(any.kind(), "mock");
//! ```

use crate::mock::MockTransport;
use crate::traits::{ConfigurationCommand, ReaderTransport};
use crate::Result;

/// Every transport the reader façade can drive.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Simulated reader for development and testing.
    Mock(MockTransport),
}

impl AnyTransport {
    /// Short name of the transport kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
        }
    }
}

impl From<MockTransport> for AnyTransport {
    fn from(transport: MockTransport) -> Self {
        Self::Mock(transport)
    }
}

impl ReaderTransport for AnyTransport {
    async fn send_configuration_command(&self, command: &ConfigurationCommand) -> Result<()> {
        match self {
            Self::Mock(transport) => transport.send_configuration_command(command).await,
        }
    }

    async fn query_attached_radio_count(&self) -> Result<u8> {
        match self {
            Self::Mock(transport) => transport.query_attached_radio_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ConfigField;

    #[tokio::test]
    async fn test_any_transport_dispatch() {
        let (transport, handle) = MockTransport::new();
        handle.set_radio_count(3);
        let any = AnyTransport::from(transport);

        assert_eq!(any.query_attached_radio_count().await.unwrap(), 3);

        let command = ConfigurationCommand::new(0).with_field(ConfigField::LbtEnabled(true));
        any.send_configuration_command(&command).await.unwrap();
        assert_eq!(handle.sent_count(), 1);
    }

    #[test]
    fn test_any_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnyTransport>();
    }
}
