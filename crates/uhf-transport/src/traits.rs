//! Transport trait and the command vocabulary it carries.
//!
//! All trait methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use serde::{Deserialize, Serialize};
use uhf_core::{OperationMode, RegionCode, Singulation};

use crate::Result;

/// One changed configuration parameter.
///
/// The control core only sends fields whose value actually changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
#[non_exhaustive]
pub enum ConfigField {
    Region(RegionCode),

    /// Output power in tenths of dBm.
    PowerLevel(u16),

    /// Channel id plus its centre frequency when the plan defines one.
    Channel {
        channel: u8,
        frequency_khz: Option<u32>,
    },

    FixedChannel(bool),

    LinkProfile(u16),

    OperationMode(OperationMode),

    Singulation(Singulation),

    LbtEnabled(bool),

    InventoryDurationMs(u32),

    InventoryCycles(u16),

    /// Radio unit subsequent commands address.
    ActiveRadio(u8),
}

impl ConfigField {
    /// Short parameter name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Region(_) => "region",
            Self::PowerLevel(_) => "power_level",
            Self::Channel { .. } => "channel",
            Self::FixedChannel(_) => "fixed_channel",
            Self::LinkProfile(_) => "link_profile",
            Self::OperationMode(_) => "operation_mode",
            Self::Singulation(_) => "singulation",
            Self::LbtEnabled(_) => "lbt_enabled",
            Self::InventoryDurationMs(_) => "inventory_duration_ms",
            Self::InventoryCycles(_) => "inventory_cycles",
            Self::ActiveRadio(_) => "active_radio",
        }
    }
}

/// A batch of configuration changes addressed to one radio unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigurationCommand {
    /// Index of the radio unit the fields apply to.
    pub radio: u8,

    /// Changed fields, in application order.
    pub fields: Vec<ConfigField>,
}

impl ConfigurationCommand {
    /// Create an empty command for `radio`.
    pub fn new(radio: u8) -> Self {
        Self {
            radio,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn with_field(mut self, field: ConfigField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: ConfigField) {
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Comma separated field names, used in logs.
    pub fn field_names(&self) -> String {
        self.fields
            .iter()
            .map(ConfigField::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Link to a physical (or simulated) reader.
///
/// Implementations own framing, timeouts and retries. The control core
/// treats any error as a fault of the reader.
///
/// # Thread Safety
///
/// Methods take `&self` and implementations must be `Send + Sync`; the
/// reader façade calls them from whichever task issued the operation,
/// never while holding its own lock.
///
/// # Examples
///
/// ```no_run
/// use uhf_transport::{ConfigField, ConfigurationCommand, ReaderTransport, Result};
///
/// async fn set_power<T: ReaderTransport>(transport: &T, level: u16) -> Result<()> {
///     let command = ConfigurationCommand::new(0).with_field(ConfigField::PowerLevel(level));
///     transport.send_configuration_command(&command).await
/// }
/// ```
pub trait ReaderTransport: Send + Sync {
    /// Apply a batch of configuration changes on the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reader is disconnected
    /// - The command was not acknowledged in time
    /// - The reader refused the command
    async fn send_configuration_command(&self, command: &ConfigurationCommand) -> Result<()>;

    /// Ask the reader how many radio units are attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be reached.
    async fn query_attached_radio_count(&self) -> Result<u8>;
}
