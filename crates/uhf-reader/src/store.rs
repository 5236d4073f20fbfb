//! Validated operating configuration.
//!
//! [`OperationConfig`] is the record of current radio parameters and
//! [`ConfigurationStore`] owns the single live copy of it. Every change goes
//! through a mutator that produces a candidate record; the candidate is
//! checked against the region's [`Capabilities`] and committed only if every
//! invariant holds, so no partial update ever becomes visible.
//!
//! Validation and commit are separate steps. [`ConfigurationStore::prepare`]
//! is a pure function of a snapshot and needs no lock;
//! [`ConfigurationStore::commit`] is O(1) and refuses a candidate built from
//! a snapshot that another writer has since replaced.
//!
//! # Region changes
//!
//! Explicit out-of-range values are always rejected. A write prepared with
//! [`RegionChange::Normalize`] only changes the region; every other field
//! is brought into the new region's limits: power is clamped to the new
//! ceiling, an unsupported link profile falls back to the region's first
//! profile, fixed-channel operation is forced where the region requires it
//! and an out-of-plan channel is reset. With [`RegionChange::Strict`] the
//! candidate is validated exactly as written.
//!
//! While the region is `UNKNOWN` the only accepted write is a change to a
//! known region.
//!
//! # Examples
//!
//! ```
//! use uhf_core::{HardwareFamily, RegionCode};
//! use uhf_reader::ReaderOptions;
//! use uhf_reader::store::{ConfigurationStore, RegionChange};
//!
//! let options = ReaderOptions::for_region(RegionCode::Fcc);
//! let mut store = ConfigurationStore::from_options(&options, HardwareFamily::R2000).unwrap();
//!
//! store.try_replace(RegionChange::Strict, |mut c| { c.power_level = 250; c }).unwrap();
//! assert_eq!(store.snapshot().power_level, 250);
//!
//! // Above the FCC ceiling: rejected, nothing changes
//! assert!(store.try_replace(RegionChange::Strict, |mut c| { c.power_level = 400; c }).is_err());
//! assert_eq!(store.snapshot().power_level, 250);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;
use uhf_core::{
    Capabilities, HardwareFamily, OperationMode, ReaderError, RegionCode, Result, Singulation,
    capabilities,
    constants::{
        DEFAULT_CHANNEL, DEFAULT_INVENTORY_CYCLES, DEFAULT_INVENTORY_DURATION_MS,
        DEFAULT_POWER_LEVEL, MAX_INVENTORY_DURATION_MS, MIN_INVENTORY_DURATION_MS,
    },
};
use uhf_transport::{ConfigField, ConfigurationCommand};

use crate::config::ReaderOptions;

/// Current operating parameters of the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub region: RegionCode,

    /// Output power in tenths of dBm.
    pub power_level: u16,

    pub channel: u8,

    /// Link profile id; `None` only while the region is `Unknown`.
    pub link_profile: Option<u16>,

    pub operation_mode: OperationMode,

    pub singulation: Singulation,

    pub lbt_enabled: bool,

    pub fixed_channel: bool,

    pub inventory_duration_ms: u32,

    pub inventory_cycles: u16,

    selected_frequency_khz: Option<u32>,
}

impl OperationConfig {
    /// Configuration of a reader with no region selected.
    pub fn unconfigured() -> Self {
        Self {
            region: RegionCode::Unknown,
            power_level: 0,
            channel: DEFAULT_CHANNEL,
            link_profile: None,
            operation_mode: OperationMode::default(),
            singulation: Singulation::default(),
            lbt_enabled: false,
            fixed_channel: false,
            inventory_duration_ms: DEFAULT_INVENTORY_DURATION_MS,
            inventory_cycles: DEFAULT_INVENTORY_CYCLES,
            selected_frequency_khz: None,
        }
    }

    /// Build the starting configuration for `options` on `family`.
    ///
    /// Requested values are normalized against the region like a region
    /// change, then validated.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` for values no normalization can fix
    /// (singulation Q, inventory duration, an explicitly requested profile
    /// the region does not allow).
    pub fn from_options(options: &ReaderOptions, family: HardwareFamily) -> Result<Self> {
        let caps = capabilities(options.region, family)?;

        let mut config = Self {
            region: options.region,
            power_level: caps.clamp_power(options.power_level),
            channel: options.channel,
            link_profile: options.link_profile.or(caps.default_profile()),
            operation_mode: options.operation_mode,
            singulation: options.singulation,
            lbt_enabled: options.lbt_enabled,
            fixed_channel: options.fixed_channel || caps.fixed_channel_only,
            inventory_duration_ms: options.inventory_duration_ms,
            inventory_cycles: options.inventory_cycles,
            selected_frequency_khz: None,
        };
        if !caps.allows_channel(config.channel) {
            config.channel = DEFAULT_CHANNEL;
        }

        config.validate(&caps)?;
        config.refresh_derived(&caps);
        Ok(config)
    }

    /// Centre frequency of the selected channel, when the region has a plan.
    pub fn selected_frequency_khz(&self) -> Option<u32> {
        self.selected_frequency_khz
    }

    /// Check every invariant against `caps`.
    ///
    /// # Errors
    /// Returns the first violated invariant as `ReaderError::Validation`.
    pub fn validate(&self, caps: &Capabilities) -> Result<()> {
        if !caps.allows_power(self.power_level) {
            return Err(ReaderError::validation(
                "power_level",
                format!(
                    "{} exceeds the {} ceiling of {} (tenths of dBm)",
                    self.power_level, self.region, caps.max_power_level
                ),
            ));
        }

        match (self.region.is_known(), self.link_profile) {
            (false, None) => {}
            (false, Some(_)) => {
                return Err(ReaderError::validation(
                    "link_profile",
                    format!("region {} allows no link profiles", self.region),
                ));
            }
            (true, None) => {
                return Err(ReaderError::validation(
                    "link_profile",
                    format!("region {} requires a link profile", self.region),
                ));
            }
            (true, Some(profile)) if !caps.allows_profile(profile) => {
                return Err(ReaderError::validation(
                    "link_profile",
                    format!(
                        "profile {profile} not allowed in {}; allowed: {:?}",
                        self.region, caps.allowed_link_profiles
                    ),
                ));
            }
            (true, Some(_)) => {}
        }

        if caps.fixed_channel_only && !self.fixed_channel {
            return Err(ReaderError::validation(
                "fixed_channel",
                format!("region {} requires fixed-channel operation", self.region),
            ));
        }

        if self.region.is_known() && !caps.allows_channel(self.channel) {
            return Err(ReaderError::validation(
                "channel",
                format!(
                    "channel {} outside the {} plan of {} channels",
                    self.channel, self.region, caps.channel_plan.count
                ),
            ));
        }

        self.singulation.validate()?;

        if !(MIN_INVENTORY_DURATION_MS..=MAX_INVENTORY_DURATION_MS)
            .contains(&self.inventory_duration_ms)
        {
            return Err(ReaderError::validation(
                "inventory_duration_ms",
                format!(
                    "{} outside {MIN_INVENTORY_DURATION_MS}-{MAX_INVENTORY_DURATION_MS}",
                    self.inventory_duration_ms
                ),
            ));
        }

        Ok(())
    }

    /// Fields that differ from `previous`, in application order.
    ///
    /// With no previous configuration every field is listed.
    pub fn changes_from(&self, previous: Option<&OperationConfig>) -> Vec<ConfigField> {
        fn changed<T: PartialEq>(
            previous: Option<&OperationConfig>,
            get: impl Fn(&OperationConfig) -> T,
            current: &T,
        ) -> bool {
            previous.is_none_or(|p| get(p) != *current)
        }

        let mut fields = Vec::new();

        if changed(previous, |c| c.region, &self.region) {
            fields.push(ConfigField::Region(self.region));
        }
        if changed(previous, |c| c.fixed_channel, &self.fixed_channel) {
            fields.push(ConfigField::FixedChannel(self.fixed_channel));
        }
        if changed(previous, |c| c.selected_frequency_khz, &self.selected_frequency_khz)
            || changed(previous, |c| c.channel, &self.channel)
        {
            fields.push(ConfigField::Channel {
                channel: self.channel,
                frequency_khz: self.selected_frequency_khz,
            });
        }
        if let Some(profile) = self.link_profile
            && changed(previous, |c| c.link_profile, &self.link_profile)
        {
            fields.push(ConfigField::LinkProfile(profile));
        }
        if changed(previous, |c| c.power_level, &self.power_level) {
            fields.push(ConfigField::PowerLevel(self.power_level));
        }
        if changed(previous, |c| c.operation_mode, &self.operation_mode) {
            fields.push(ConfigField::OperationMode(self.operation_mode));
        }
        if changed(previous, |c| c.singulation, &self.singulation) {
            fields.push(ConfigField::Singulation(self.singulation));
        }
        if changed(previous, |c| c.lbt_enabled, &self.lbt_enabled) {
            fields.push(ConfigField::LbtEnabled(self.lbt_enabled));
        }
        if changed(previous, |c| c.inventory_duration_ms, &self.inventory_duration_ms) {
            fields.push(ConfigField::InventoryDurationMs(self.inventory_duration_ms));
        }
        if changed(previous, |c| c.inventory_cycles, &self.inventory_cycles) {
            fields.push(ConfigField::InventoryCycles(self.inventory_cycles));
        }

        fields
    }

    /// Command carrying the changes from `previous` to this configuration.
    pub fn command_from(&self, previous: Option<&OperationConfig>, radio: u8) -> ConfigurationCommand {
        ConfigurationCommand {
            radio,
            fields: self.changes_from(previous),
        }
    }

    fn refresh_derived(&mut self, caps: &Capabilities) {
        self.selected_frequency_khz = caps.channel_plan.frequency_khz(self.channel);
    }

    /// Bring fields other than the region into the limits of a new region.
    fn normalize_for_region(&mut self, base: &OperationConfig, caps: &Capabilities) {
        if self.power_level == base.power_level {
            self.power_level = if base.region.is_known() {
                caps.clamp_power(self.power_level)
            } else {
                caps.clamp_power(DEFAULT_POWER_LEVEL)
            };
        }

        if self.link_profile == base.link_profile
            && !self.link_profile.is_some_and(|p| caps.allows_profile(p))
        {
            self.link_profile = caps.default_profile();
        }

        if self.fixed_channel == base.fixed_channel && caps.fixed_channel_only {
            self.fixed_channel = true;
        }

        if self.channel == base.channel && !caps.allows_channel(self.channel) {
            self.channel = DEFAULT_CHANNEL;
        }
    }
}

/// How a write that changes the region treats the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionChange {
    /// The write only sets the region; other fields are brought into the
    /// new region's limits.
    #[default]
    Normalize,

    /// Every field is validated as written.
    Strict,
}

/// A candidate configuration that passed validation against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    config: OperationConfig,
    base_revision: u64,
}

impl Validated {
    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    /// Revision of the snapshot the candidate was built from.
    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }
}

/// A validated candidate lost the race against another commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("configuration changed since revision {expected} (now {current})")]
pub struct StaleSnapshot {
    pub expected: u64,
    pub current: u64,
}

/// Owner of the live configuration record.
///
/// Not synchronized on its own; the reader façade keeps it behind the same
/// lock as the lifecycle state machine.
#[derive(Debug)]
pub struct ConfigurationStore {
    config: OperationConfig,
    family: HardwareFamily,
    revision: u64,
}

impl ConfigurationStore {
    /// Store holding [`OperationConfig::unconfigured`].
    pub fn unconfigured(family: HardwareFamily) -> Self {
        Self {
            config: OperationConfig::unconfigured(),
            family,
            revision: 0,
        }
    }

    /// Create a store holding the starting configuration for `options`.
    ///
    /// # Errors
    /// See [`OperationConfig::from_options`].
    pub fn from_options(options: &ReaderOptions, family: HardwareFamily) -> Result<Self> {
        Ok(Self {
            config: OperationConfig::from_options(options, family)?,
            family,
            revision: 0,
        })
    }

    /// Owned copy of the current configuration.
    pub fn snapshot(&self) -> OperationConfig {
        self.config.clone()
    }

    /// Number of commits since the store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn family(&self) -> HardwareFamily {
        self.family
    }

    /// Capabilities of the current region.
    pub fn capabilities(&self) -> Result<Capabilities> {
        capabilities(self.config.region, self.family)
    }

    /// Build and validate a candidate from `base` without touching any store.
    ///
    /// With [`RegionChange::Normalize`], fields the mutator left equal to
    /// `base` are normalized when the region changes. Callers that set
    /// other fields alongside the region should pass
    /// [`RegionChange::Strict`], otherwise a value that happens to equal the
    /// old one would be clamped instead of rejected.
    ///
    /// # Errors
    /// Returns `ReaderError::Validation` if the candidate violates an
    /// invariant, or `ReaderError::InvalidRegion` if the candidate's region
    /// has no capabilities on `family`.
    pub fn prepare<F>(
        base: &OperationConfig,
        base_revision: u64,
        family: HardwareFamily,
        region_change: RegionChange,
        mutator: F,
    ) -> Result<Validated>
    where
        F: FnOnce(OperationConfig) -> OperationConfig,
    {
        let mut candidate = mutator(base.clone());
        let caps = capabilities(candidate.region, family)?;

        if !base.region.is_known() && !candidate.region.is_known() {
            return Err(ReaderError::validation(
                "region",
                "region UNKNOWN accepts only a change to a known region",
            ));
        }

        if region_change == RegionChange::Normalize && candidate.region != base.region {
            candidate.normalize_for_region(base, &caps);
        }

        candidate.validate(&caps)?;
        candidate.refresh_derived(&caps);

        Ok(Validated {
            config: candidate,
            base_revision,
        })
    }

    /// Install a validated candidate if nothing was committed since its snapshot.
    ///
    /// # Errors
    /// Returns [`StaleSnapshot`] if another commit happened in between; the
    /// store is unchanged and the caller should rebuild the candidate.
    pub fn commit(&mut self, validated: Validated) -> std::result::Result<OperationConfig, StaleSnapshot> {
        if validated.base_revision != self.revision {
            return Err(StaleSnapshot {
                expected: validated.base_revision,
                current: self.revision,
            });
        }

        self.config = validated.config;
        self.revision += 1;
        trace!(revision = self.revision, "configuration committed");
        Ok(self.config.clone())
    }

    /// Validate and commit in one step.
    ///
    /// # Errors
    /// Returns the validation error; the store is unchanged.
    pub fn try_replace<F>(&mut self, region_change: RegionChange, mutator: F) -> Result<OperationConfig>
    where
        F: FnOnce(OperationConfig) -> OperationConfig,
    {
        let validated = Self::prepare(&self.config, self.revision, self.family, region_change, mutator)?;
        self.commit(validated).map_err(|stale| {
            ReaderError::validation("revision", stale.to_string())
        })
    }

    /// Replace the whole configuration, e.g. when a new session starts.
    pub fn reset(&mut self, config: OperationConfig) {
        self.config = config;
        self.revision += 1;
    }
}
