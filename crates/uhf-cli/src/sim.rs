//! Simulation scenario file.
//!
//! ```json
//! {
//!   "hardware_family": "e710",
//!   "radio_count": 2,
//!   "options": { "region": "FCC" },
//!   "steps": [
//!     { "op": "power", "level": 250 },
//!     { "op": "region", "region": "ETSI" },
//!     { "op": "run" }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uhf_core::{HardwareFamily, RegionCode};
use uhf_reader::ReaderOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub hardware_family: HardwareFamily,
    pub radio_count: u8,
    /// Artificial transport latency in milliseconds.
    pub latency_ms: u64,
    pub options: ReaderOptions,
    pub steps: Vec<SimStep>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hardware_family: HardwareFamily::R2000,
            radio_count: 1,
            latency_ms: 0,
            options: ReaderOptions::for_region(RegionCode::Fcc),
            steps: vec![
                SimStep::Power { level: 250 },
                SimStep::Region {
                    region: RegionCode::Etsi,
                },
                SimStep::Power { level: 300 },
                SimStep::Profile { id: 2 },
                SimStep::Run,
            ],
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

/// One scripted action against the reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum SimStep {
    Region { region: RegionCode },
    Power { level: u16 },
    Profile { id: u16 },
    Channel { id: u8 },
    Lbt { enabled: bool },
    Inventory { duration_ms: u64, cycles: u16 },
    SelectRadio { index: u8 },
    /// Begin and immediately end an inventory run.
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let config: SimConfig = serde_json::from_str(
            r#"{
                "hardware_family": "e710",
                "options": { "region": "JP" },
                "steps": [{ "op": "channel", "id": 3 }, { "op": "run" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.hardware_family, HardwareFamily::E710);
        assert_eq!(config.radio_count, 1);
        assert_eq!(config.options.region, RegionCode::Jp);
        assert_eq!(config.steps.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(SimConfig::load("/nonexistent/uhf-sim.json").is_err());
    }
}
