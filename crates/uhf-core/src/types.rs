use crate::{
    Result,
    constants::{MAX_RADIO_COUNT, MAX_START_Q},
    error::ReaderError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regulatory domain the reader operates under.
///
/// `Unknown` is the state of a reader whose region has not been programmed;
/// it has no usable link profiles and only accepts a region change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionCode {
    Fcc,
    Etsi,
    Jp,
    Kr,
    Cn,
    Tw,
    Unknown,
}

impl RegionCode {
    /// Every declared region, in table order.
    pub const ALL: [RegionCode; 7] = [
        RegionCode::Fcc,
        RegionCode::Etsi,
        RegionCode::Jp,
        RegionCode::Kr,
        RegionCode::Cn,
        RegionCode::Tw,
        RegionCode::Unknown,
    ];

    /// Decode the numeric region code reported by reader firmware.
    ///
    /// # Errors
    /// Returns `ReaderError::InvalidRegion` for codes outside 0-6.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(RegionCode::Unknown),
            1 => Ok(RegionCode::Fcc),
            2 => Ok(RegionCode::Etsi),
            3 => Ok(RegionCode::Jp),
            4 => Ok(RegionCode::Kr),
            5 => Ok(RegionCode::Cn),
            6 => Ok(RegionCode::Tw),
            other => Err(ReaderError::invalid_region(other.to_string())),
        }
    }

    /// Numeric firmware code for this region.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            RegionCode::Unknown => 0,
            RegionCode::Fcc => 1,
            RegionCode::Etsi => 2,
            RegionCode::Jp => 3,
            RegionCode::Kr => 4,
            RegionCode::Cn => 5,
            RegionCode::Tw => 6,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionCode::Fcc => "FCC",
            RegionCode::Etsi => "ETSI",
            RegionCode::Jp => "JP",
            RegionCode::Kr => "KR",
            RegionCode::Cn => "CN",
            RegionCode::Tw => "TW",
            RegionCode::Unknown => "UNKNOWN",
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, RegionCode::Unknown)
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegionCode {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        RegionCode::ALL
            .into_iter()
            .find(|region| region.as_str() == normalized)
            .ok_or_else(|| ReaderError::invalid_region(s))
    }
}

/// Reader chipset generation.
///
/// Selected once at startup; together with the region it picks the row of
/// the capability table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HardwareFamily {
    /// First generation readers built on the R2000 transceiver.
    #[default]
    R2000,

    /// Second generation readers built on the E710 transceiver.
    E710,
}

impl HardwareFamily {
    pub const ALL: [HardwareFamily; 2] = [HardwareFamily::R2000, HardwareFamily::E710];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareFamily::R2000 => "r2000",
            HardwareFamily::E710 => "e710",
        }
    }
}

impl fmt::Display for HardwareFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HardwareFamily {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r2000" => Ok(HardwareFamily::R2000),
            "e710" => Ok(HardwareFamily::E710),
            _ => Err(ReaderError::validation(
                "hardware_family",
                format!("unknown hardware family '{s}'"),
            )),
        }
    }
}

/// Whether inventory rounds run back to back or one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    #[default]
    Continuous,
    NonContinuous,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationMode::Continuous => write!(f, "continuous"),
            OperationMode::NonContinuous => write!(f, "non-continuous"),
        }
    }
}

/// Anti-collision algorithm used to enumerate tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "algorithm")]
pub enum Singulation {
    /// Fixed slot count of `2^q`.
    FixedQ { q: u8 },

    /// Q adapts between rounds, starting at `start_q`.
    DynamicQ { start_q: u8 },
}

impl Singulation {
    /// The (initial) Q value, regardless of algorithm.
    #[must_use]
    pub fn q(&self) -> u8 {
        match self {
            Singulation::FixedQ { q } => *q,
            Singulation::DynamicQ { start_q } => *start_q,
        }
    }

    /// Check the Q value against the Gen2 four-bit limit.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` if Q exceeds [`MAX_START_Q`].
    pub fn validate(&self) -> Result<()> {
        if self.q() > MAX_START_Q {
            return Err(ReaderError::validation(
                "singulation",
                format!("Q must be 0-{MAX_START_Q}, got {}", self.q()),
            ));
        }
        Ok(())
    }
}

impl Default for Singulation {
    fn default() -> Self {
        Singulation::DynamicQ {
            start_q: crate::constants::DEFAULT_START_Q,
        }
    }
}

/// Lifecycle state of the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    NotInitialized,
    Initializing,
    Ready,
    Operating,
    ShuttingDown,
    Error,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LifecycleState::NotInitialized => "NotInitialized",
            LifecycleState::Initializing => "Initializing",
            LifecycleState::Ready => "Ready",
            LifecycleState::Operating => "Operating",
            LifecycleState::ShuttingDown => "ShuttingDown",
            LifecycleState::Error => "Error",
        };
        write!(f, "{}", state_str)
    }
}

/// Radio units reported by the reader and the one currently addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadioAttachment {
    count: u8,
    active: u8,
}

impl RadioAttachment {
    /// Record an attachment of `count` radios with radio 0 active.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` if `count` is 0 or exceeds
    /// [`MAX_RADIO_COUNT`].
    pub fn new(count: u8) -> Result<Self> {
        if !(1..=MAX_RADIO_COUNT).contains(&count) {
            return Err(ReaderError::validation(
                "radio_count",
                format!("radio count must be 1-{MAX_RADIO_COUNT}, got {count}"),
            ));
        }
        Ok(Self { count, active: 0 })
    }

    /// Return a copy addressing a different radio.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` if `index >= count`.
    pub fn with_active(self, index: u8) -> Result<Self> {
        if index >= self.count {
            return Err(ReaderError::validation(
                "active_radio",
                format!("radio index {index} out of range 0-{}", self.count.saturating_sub(1)),
            ));
        }
        Ok(Self {
            active: index,
            ..self
        })
    }

    #[must_use]
    pub fn count(&self) -> u8 {
        self.count
    }

    #[must_use]
    pub fn active(&self) -> u8 {
        self.active
    }

    /// True before any radio has been attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("FCC", RegionCode::Fcc)]
    #[case("etsi", RegionCode::Etsi)]
    #[case(" jp ", RegionCode::Jp)]
    #[case("Unknown", RegionCode::Unknown)]
    fn test_region_code_parse(#[case] input: &str, #[case] expected: RegionCode) {
        let region: RegionCode = input.parse().unwrap();
        assert_eq!(region, expected);
    }

    #[rstest]
    #[case("EU")]
    #[case("")]
    #[case("FCC2")]
    fn test_region_code_parse_invalid(#[case] input: &str) {
        let result: Result<RegionCode> = input.parse();
        assert!(matches!(result, Err(ReaderError::InvalidRegion { .. })));
    }

    #[test]
    fn test_region_code_numeric() {
        for region in RegionCode::ALL {
            assert_eq!(RegionCode::from_code(region.code()).unwrap(), region);
        }
        assert!(matches!(
            RegionCode::from_code(7),
            Err(ReaderError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_region_code_serde_name() {
        let json = serde_json::to_string(&RegionCode::Etsi).unwrap();
        assert_eq!(json, "\"ETSI\"");
    }

    #[rstest]
    #[case("r2000", HardwareFamily::R2000)]
    #[case("E710", HardwareFamily::E710)]
    fn test_hardware_family_parse(#[case] input: &str, #[case] expected: HardwareFamily) {
        assert_eq!(input.parse::<HardwareFamily>().unwrap(), expected);
    }

    #[test]
    fn test_singulation_q_limit() {
        assert!(Singulation::FixedQ { q: 15 }.validate().is_ok());
        assert!(Singulation::DynamicQ { start_q: 16 }.validate().is_err());
    }

    #[test]
    fn test_radio_attachment() {
        assert!(RadioAttachment::new(0).is_err());
        assert!(RadioAttachment::new(MAX_RADIO_COUNT + 1).is_err());

        let attachment = RadioAttachment::new(2).unwrap();
        assert_eq!(attachment.active(), 0);
        assert_eq!(attachment.with_active(1).unwrap().active(), 1);
        assert!(attachment.with_active(2).is_err());
        assert!(RadioAttachment::default().is_empty());
    }

    #[test]
    fn test_lifecycle_state_display() {
        assert_eq!(LifecycleState::NotInitialized.to_string(), "NotInitialized");
        assert_eq!(LifecycleState::ShuttingDown.to_string(), "ShuttingDown");
    }
}
