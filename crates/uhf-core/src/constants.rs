//! Core constants for reader configuration.
//!
//! Defaults and hard limits that apply regardless of region or hardware
//! family. Region-specific ceilings live in the capability table in
//! [`crate::region`], never here.
//!
//! # Units
//!
//! | Quantity | Unit | Example |
//! |----------|------|---------|
//! | Power level | tenths of dBm | `300` = 30.0 dBm |
//! | Frequency | kHz | `902_750` = 902.75 MHz |
//! | Inventory duration | milliseconds | `2000` |
//!
//! # Usage
//!
//! ```
//! use uhf_core::constants::*;
//!
//! assert_eq!(DEFAULT_POWER_LEVEL, 300);
//! assert!(DEFAULT_INVENTORY_DURATION_MS >= MIN_INVENTORY_DURATION_MS);
//! ```

// ============================================================================
// Radio Defaults
// ============================================================================

/// Power level applied to a freshly constructed configuration.
///
/// Expressed in tenths of dBm. Regions whose ceiling is lower than this
/// value clamp it when the configuration is first built.
pub const DEFAULT_POWER_LEVEL: u16 = 300;

/// Channel selected when a configuration is first built.
pub const DEFAULT_CHANNEL: u8 = 0;

/// Initial Q value for the singulation algorithm.
pub const DEFAULT_START_Q: u8 = 4;

/// Largest Q value accepted by the Gen2 singulation algorithms.
///
/// The air protocol encodes Q in four bits.
pub const MAX_START_Q: u8 = 15;

// ============================================================================
// Inventory Timing
// ============================================================================

/// Default dwell time of one inventory round in milliseconds.
pub const DEFAULT_INVENTORY_DURATION_MS: u32 = 2000;

/// Shortest accepted inventory round.
pub const MIN_INVENTORY_DURATION_MS: u32 = 10;

/// Longest accepted inventory round.
///
/// ETSI and JP dwell limits are well below this; the bound only rejects
/// nonsensical values.
pub const MAX_INVENTORY_DURATION_MS: u32 = 60_000;

/// Default number of inventory cycles per round (0 = until stopped).
pub const DEFAULT_INVENTORY_CYCLES: u16 = 0;

// ============================================================================
// Attachment
// ============================================================================

/// Maximum number of radio units a single reader can report.
pub const MAX_RADIO_COUNT: u8 = 16;

// ============================================================================
// Bookkeeping
// ============================================================================

/// Maximum number of lifecycle transitions kept in history.
///
/// Each entry is two enums plus a timestamp; 100 entries stay well under
/// 4KB per reader.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Capacity of the bounded event channel created by convenience helpers.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;
