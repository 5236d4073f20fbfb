//! Regional capability table.
//!
//! Maps `(RegionCode, HardwareFamily)` to the power ceiling, the link
//! profiles the air interface may use, the channel plan, and whether the
//! region mandates fixed-channel operation. This table is the only place
//! these limits are defined; everything else asks [`capabilities`].
//!
//! # Examples
//!
//! ```
//! use uhf_core::{HardwareFamily, RegionCode, capabilities};
//!
//! let caps = capabilities(RegionCode::Etsi, HardwareFamily::R2000).unwrap();
//! assert_eq!(caps.max_power_level, 275);
//! assert!(caps.allows_profile(1));
//!
//! let unknown = capabilities(RegionCode::Unknown, HardwareFamily::R2000).unwrap();
//! assert!(unknown.allowed_link_profiles.is_empty());
//! ```

use crate::{
    Result,
    error::ReaderError,
    types::{HardwareFamily, RegionCode},
};
use serde::Serialize;

/// Channel layout of a region: `count` channels spaced `spacing_khz` apart,
/// the first centred on `first_khz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelPlan {
    pub first_khz: u32,
    pub spacing_khz: u32,
    pub count: u8,
}

impl ChannelPlan {
    const NONE: ChannelPlan = ChannelPlan {
        first_khz: 0,
        spacing_khz: 0,
        count: 0,
    };

    const fn new(first_khz: u32, spacing_khz: u32, count: u8) -> Self {
        Self {
            first_khz,
            spacing_khz,
            count,
        }
    }

    #[must_use]
    pub fn contains(&self, channel: u8) -> bool {
        channel < self.count
    }

    /// Centre frequency of `channel`, or `None` if the plan has no such channel.
    #[must_use]
    pub fn frequency_khz(&self, channel: u8) -> Option<u32> {
        self.contains(channel)
            .then(|| self.first_khz + u32::from(channel) * self.spacing_khz)
    }
}

/// What the reader may do in a given region on a given hardware family.
///
/// Derived on demand; never stored alongside the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Power ceiling in tenths of dBm.
    pub max_power_level: u16,

    /// Allowed link profile ids, ascending. Empty only for `Unknown`.
    pub allowed_link_profiles: &'static [u16],

    /// Region forbids frequency hopping.
    pub fixed_channel_only: bool,

    pub channel_plan: ChannelPlan,
}

impl Capabilities {
    #[must_use]
    pub fn allows_power(&self, level: u16) -> bool {
        level <= self.max_power_level
    }

    #[must_use]
    pub fn allows_profile(&self, profile: u16) -> bool {
        self.allowed_link_profiles.binary_search(&profile).is_ok()
    }

    #[must_use]
    pub fn allows_channel(&self, channel: u8) -> bool {
        self.channel_plan.contains(channel)
    }

    /// The profile a configuration falls back to when entering this region.
    #[must_use]
    pub fn default_profile(&self) -> Option<u16> {
        self.allowed_link_profiles.first().copied()
    }

    #[must_use]
    pub fn clamp_power(&self, level: u16) -> u16 {
        level.min(self.max_power_level)
    }
}

struct CapabilityRow {
    region: RegionCode,
    family: HardwareFamily,
    capabilities: Capabilities,
}

const fn row(
    region: RegionCode,
    family: HardwareFamily,
    max_power_level: u16,
    allowed_link_profiles: &'static [u16],
    fixed_channel_only: bool,
    channel_plan: ChannelPlan,
) -> CapabilityRow {
    CapabilityRow {
        region,
        family,
        capabilities: Capabilities {
            max_power_level,
            allowed_link_profiles,
            fixed_channel_only,
            channel_plan,
        },
    }
}

const PLAN_FCC: ChannelPlan = ChannelPlan::new(902_750, 500, 50);
const PLAN_ETSI: ChannelPlan = ChannelPlan::new(865_700, 600, 4);
const PLAN_JP: ChannelPlan = ChannelPlan::new(916_800, 1_200, 4);
const PLAN_KR: ChannelPlan = ChannelPlan::new(917_300, 600, 6);
const PLAN_CN: ChannelPlan = ChannelPlan::new(920_625, 250, 16);
const PLAN_TW: ChannelPlan = ChannelPlan::new(922_250, 500, 10);

const R2000_PROFILES: &[u16] = &[0, 1, 2, 3];
const R2000_DENSE_PROFILES: &[u16] = &[1, 2];
const E710_PROFILES: &[u16] = &[1, 3, 5, 7, 11, 13, 15];
const E710_ETSI_PROFILES: &[u16] = &[1, 3, 7, 11];
const E710_JP_PROFILES: &[u16] = &[1, 3, 7];
const NO_PROFILES: &[u16] = &[];

#[rustfmt::skip]
static CAPABILITY_TABLE: &[CapabilityRow] = &[
    row(RegionCode::Fcc,     HardwareFamily::R2000, 300, R2000_PROFILES,       false, PLAN_FCC),
    row(RegionCode::Etsi,    HardwareFamily::R2000, 275, R2000_DENSE_PROFILES, false, PLAN_ETSI),
    row(RegionCode::Jp,      HardwareFamily::R2000, 300, R2000_DENSE_PROFILES, true,  PLAN_JP),
    row(RegionCode::Kr,      HardwareFamily::R2000, 300, R2000_PROFILES,       false, PLAN_KR),
    row(RegionCode::Cn,      HardwareFamily::R2000, 300, R2000_PROFILES,       false, PLAN_CN),
    row(RegionCode::Tw,      HardwareFamily::R2000, 300, R2000_PROFILES,       false, PLAN_TW),
    row(RegionCode::Unknown, HardwareFamily::R2000,   0, NO_PROFILES,          false, ChannelPlan::NONE),
    row(RegionCode::Fcc,     HardwareFamily::E710,  320, E710_PROFILES,        false, PLAN_FCC),
    row(RegionCode::Etsi,    HardwareFamily::E710,  300, E710_ETSI_PROFILES,   false, PLAN_ETSI),
    row(RegionCode::Jp,      HardwareFamily::E710,  300, E710_JP_PROFILES,     true,  PLAN_JP),
    row(RegionCode::Kr,      HardwareFamily::E710,  300, E710_PROFILES,        false, PLAN_KR),
    row(RegionCode::Cn,      HardwareFamily::E710,  300, E710_PROFILES,        false, PLAN_CN),
    row(RegionCode::Tw,      HardwareFamily::E710,  300, E710_PROFILES,        false, PLAN_TW),
    row(RegionCode::Unknown, HardwareFamily::E710,    0, NO_PROFILES,          false, ChannelPlan::NONE),
];

/// Look up the capabilities of `region` on `family`.
///
/// # Errors
/// Returns `ReaderError::InvalidRegion` if the table has no row for the
/// pair. Every declared region has a row for every family, so this only
/// fires if the table and the enums drift apart.
pub fn capabilities(region: RegionCode, family: HardwareFamily) -> Result<Capabilities> {
    CAPABILITY_TABLE
        .iter()
        .find(|row| row.region == region && row.family == family)
        .map(|row| row.capabilities)
        .ok_or_else(|| ReaderError::invalid_region(format!("{region} on {family}")))
}
