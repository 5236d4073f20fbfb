//! Reader start-up options.
//!
//! [`ReaderOptions`] carries the operating parameters a session starts
//! with. Values are requests: when the reader is initialized they are
//! normalized against the region's capabilities the same way a region change
//! is, so a default power above the regional ceiling is clamped rather than
//! stored out of range.
//!
//! # Examples
//!
//! ```
//! use uhf_core::RegionCode;
//! use uhf_reader::ReaderOptions;
//!
//! let options = ReaderOptions::from_json(r#"{ "region": "ETSI", "power_level": 250 }"#).unwrap();
//! assert_eq!(options.region, RegionCode::Etsi);
//! assert_eq!(options.power_level, 250);
//! assert!(options.link_profile.is_none());
//! ```

use serde::{Deserialize, Serialize};
use uhf_core::{
    OperationMode, ReaderError, RegionCode, Result, Singulation,
    constants::{
        DEFAULT_CHANNEL, DEFAULT_INVENTORY_CYCLES, DEFAULT_INVENTORY_DURATION_MS,
        DEFAULT_POWER_LEVEL,
    },
};

/// Operating parameters a reader session starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub region: RegionCode,

    /// Requested power in tenths of dBm.
    pub power_level: u16,

    pub channel: u8,

    /// Requested link profile; `None` picks the region's first profile.
    pub link_profile: Option<u16>,

    pub operation_mode: OperationMode,

    pub singulation: Singulation,

    pub lbt_enabled: bool,

    pub fixed_channel: bool,

    pub inventory_duration_ms: u32,

    /// Inventory cycles per round; 0 runs until stopped.
    pub inventory_cycles: u16,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            region: RegionCode::Unknown,
            power_level: DEFAULT_POWER_LEVEL,
            channel: DEFAULT_CHANNEL,
            link_profile: None,
            operation_mode: OperationMode::default(),
            singulation: Singulation::default(),
            lbt_enabled: false,
            fixed_channel: false,
            inventory_duration_ms: DEFAULT_INVENTORY_DURATION_MS,
            inventory_cycles: DEFAULT_INVENTORY_CYCLES,
        }
    }
}

impl ReaderOptions {
    /// Options for `region` with every other value at its default.
    pub fn for_region(region: RegionCode) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    /// Parse options from JSON; missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` if the document is malformed or
    /// names an unknown region.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ReaderError::validation("options", format!("malformed options: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReaderError::validation("options", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = ReaderOptions::default();
        assert_eq!(options.region, RegionCode::Unknown);
        assert_eq!(options.power_level, DEFAULT_POWER_LEVEL);
        assert_eq!(options.operation_mode, OperationMode::Continuous);
        assert!(!options.fixed_channel);
    }

    #[test]
    fn test_options_from_partial_json() {
        let options = ReaderOptions::from_json(
            r#"{
                "region": "JP",
                "link_profile": 2,
                "singulation": { "algorithm": "fixed_q", "q": 6 },
                "operation_mode": "non_continuous"
            }"#,
        )
        .unwrap();

        assert_eq!(options.region, RegionCode::Jp);
        assert_eq!(options.link_profile, Some(2));
        assert_eq!(options.singulation, Singulation::FixedQ { q: 6 });
        assert_eq!(options.operation_mode, OperationMode::NonContinuous);
        assert_eq!(options.inventory_duration_ms, DEFAULT_INVENTORY_DURATION_MS);
    }

    #[test]
    fn test_options_unknown_region_rejected() {
        let result = ReaderOptions::from_json(r#"{ "region": "EU" }"#);
        assert!(matches!(
            result,
            Err(ReaderError::Validation { field: "options", .. })
        ));
    }

    #[test]
    fn test_options_json_round_trip() {
        let options = ReaderOptions::for_region(RegionCode::Kr);
        let json = options.to_json().unwrap();
        assert_eq!(ReaderOptions::from_json(&json).unwrap(), options);
    }
}
