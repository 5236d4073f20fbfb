//! Reader façade.
//!
//! [`ReaderFacade`] is the public entry point for driving one UHF reader. It
//! owns the lifecycle state machine, the configuration store and the radio
//! attachment behind a single lock, and the transport that carries committed
//! configuration to the hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ReaderFacade                 │
//! │                                              │
//! │  Mutex<ReaderCore>                           │
//! │   ├─ LifecycleStateMachine                   │
//! │   ├─ ConfigurationStore                      │
//! │   └─ RadioAttachment                         │
//! │                                              │
//! │  send gate ──► AnyTransport ──► hardware     │
//! │  CompletionSink ◄── events (after unlock)    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Every configuration write runs the same steps: take a snapshot under the
//! lock, build and validate the candidate without the lock, commit under the
//! lock after re-checking the lifecycle guard, then send only the changed
//! fields to the transport with the lock released. A commit that loses the
//! race against another writer is rebuilt from the fresh snapshot.
//!
//! A transport failure moves the reader to `Error` and is returned as
//! `ReaderError::TransportFault`.
//!
//! # Examples
//!
//! ```
//! use uhf_core::{HardwareFamily, LifecycleState, RegionCode};
//! use uhf_reader::{ReaderFacade, ReaderOptions};
//! use uhf_transport::mock::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> uhf_core::Result<()> {
//!     let (transport, handle) = MockTransport::new();
//!     let reader = ReaderFacade::new(HardwareFamily::R2000, transport);
//!
//!     reader.initialize(ReaderOptions::for_region(RegionCode::Fcc))?;
//!     reader.attach().await?;
//!     assert_eq!(reader.state(), LifecycleState::Ready);
//!
//!     reader.set_power_level(250).await?;
//!     assert_eq!(reader.configuration().power_level, 250);
//!     assert!(handle.sent_count() >= 2);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tracing::{debug, info, trace, warn};
use uhf_core::{
    Capabilities, HardwareFamily, LifecycleState, OperationMode, RadioAttachment, ReaderError,
    RegionCode, Result, Singulation, TransportError,
};
use uhf_transport::{AnyTransport, ConfigField, ReaderTransport};

use crate::config::ReaderOptions;
use crate::events::{CompletionSink, ReaderEvent};
use crate::lifecycle::{CONFIGURABLE_STATES, LifecycleEvent, LifecycleStateMachine, StateTransition};
use crate::store::{ConfigurationStore, OperationConfig, RegionChange};

static GLOBAL: OnceLock<ReaderFacade> = OnceLock::new();

/// State guarded by the façade's lock.
#[derive(Debug)]
struct ReaderCore {
    lifecycle: LifecycleStateMachine,
    store: ConfigurationStore,
    attachment: Option<RadioAttachment>,
    /// Revision and content of the configuration the hardware last accepted.
    applied: Option<(u64, OperationConfig)>,
    /// Bumped when a session starts or ends.
    session: u64,
    /// Bumped whenever `applied` is discarded; a send that started under an
    /// older epoch must not record its result.
    epoch: u64,
}

impl ReaderCore {
    fn invalidate_applied(&mut self) {
        self.applied = None;
        self.epoch += 1;
    }

    fn end_session(&mut self) {
        self.attachment = None;
        self.invalidate_applied();
        self.session += 1;
    }
}

/// Thread-safe control surface of one reader.
pub struct ReaderFacade {
    family: HardwareFamily,
    core: Mutex<ReaderCore>,
    transport: AnyTransport,
    sink: Option<Box<dyn CompletionSink>>,
    send_gate: tokio::sync::Mutex<()>,
}

impl ReaderFacade {
    /// Create a reader in `NotInitialized` driving `transport`.
    pub fn new(family: HardwareFamily, transport: impl Into<AnyTransport>) -> Self {
        Self {
            family,
            core: Mutex::new(ReaderCore {
                lifecycle: LifecycleStateMachine::new(),
                store: ConfigurationStore::unconfigured(family),
                attachment: None,
                applied: None,
                session: 0,
                epoch: 0,
            }),
            transport: transport.into(),
            sink: None,
            send_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Deliver reader events to `sink`.
    pub fn with_sink(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// The process-wide reader, created by `init` on first call.
    ///
    /// Concurrent first calls run `init` at most once; every caller gets
    /// the same instance.
    pub fn get_or_init<F>(init: F) -> &'static ReaderFacade
    where
        F: FnOnce() -> ReaderFacade,
    {
        GLOBAL.get_or_init(init)
    }

    /// The process-wide reader, if one was created.
    pub fn global() -> Option<&'static ReaderFacade> {
        GLOBAL.get()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a session with `options`.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside
    /// `NotInitialized`, or `ReaderError::Validation` if the options cannot
    /// be normalized into a valid configuration. Nothing changes on error.
    pub fn initialize(&self, options: ReaderOptions) -> Result<StateTransition> {
        let config = OperationConfig::from_options(&options, self.family)?;

        let mut events = Vec::new();
        let transition = {
            let mut core = self.lock();
            let transition = core.lifecycle.apply(LifecycleEvent::Initialize)?;
            core.store.reset(config.clone());
            core.end_session();

            events.push(ReaderEvent::StateChanged(transition.clone()));
            events.push(ReaderEvent::ConfigurationChanged {
                config,
                revision: core.store.revision(),
            });
            transition
        };

        info!(region = %options.region, family = %self.family, "reader initializing");
        self.emit(events);
        Ok(transition)
    }

    /// Record that `count` radios are attached and push the configuration.
    ///
    /// A count of zero is treated as a failed attachment.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Initializing`,
    /// `ReaderError::Validation` for an unusable count (the reader moves to
    /// `Error`), or `ReaderError::TransportFault` if the configuration could
    /// not be sent.
    pub async fn attach_succeeded(&self, count: u8) -> Result<RadioAttachment> {
        let attachment = match RadioAttachment::new(count) {
            Ok(attachment) => attachment,
            Err(error) => {
                self.attach_failed(&error)?;
                return Err(error);
            }
        };

        let transition = {
            let mut core = self.lock();
            let transition = core.lifecycle.apply(LifecycleEvent::AttachSucceeded)?;
            core.attachment = Some(attachment);
            core.invalidate_applied();
            transition
        };

        info!(radios = count, "reader ready");
        self.emit([ReaderEvent::StateChanged(transition)]);

        self.synchronize().await?;
        Ok(attachment)
    }

    /// Record a failed radio attachment; the reader moves to `Error`.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Initializing`.
    pub fn attach_failed(&self, error: impl fmt::Display) -> Result<StateTransition> {
        let message = error.to_string();
        let transition = self.lock().lifecycle.fail_attach(message.clone())?;

        warn!("radio attachment failed: {}", message);
        self.emit([ReaderEvent::StateChanged(transition.clone())]);
        Ok(transition)
    }

    /// Ask the transport how many radios are attached and finish attachment.
    ///
    /// # Errors
    /// As [`attach_succeeded`](Self::attach_succeeded); a failed query is
    /// recorded as a failed attachment and returned as
    /// `ReaderError::TransportFault`.
    pub async fn attach(&self) -> Result<RadioAttachment> {
        self.lock().lifecycle.require(LifecycleEvent::AttachSucceeded.source_states())?;

        match self.transport.query_attached_radio_count().await {
            Ok(count) => self.attach_succeeded(count).await,
            Err(error) => {
                // The state may have moved on while the query was in flight
                if let Err(transition_error) = self.attach_failed(&error) {
                    debug!("attach failure not recorded: {}", transition_error);
                }
                Err(ReaderError::TransportFault(error))
            }
        }
    }

    /// Start an inventory run; configuration is frozen until it ends.
    ///
    /// Pending configuration is sent first.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Ready`, or
    /// `ReaderError::TransportFault` if pending configuration could not be
    /// sent.
    pub async fn begin_operation(&self) -> Result<StateTransition> {
        self.lock().lifecycle.require(LifecycleEvent::BeginOperation.source_states())?;
        self.synchronize().await?;
        self.transition(LifecycleEvent::BeginOperation)
    }

    /// End the inventory run.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Operating`.
    pub fn end_operation(&self) -> Result<StateTransition> {
        self.transition(LifecycleEvent::EndOperation)
    }

    /// End the session and release the radios.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Ready` and
    /// `Operating`.
    pub fn shutdown(&self) -> Result<StateTransition> {
        let (started, completed) = {
            let mut core = self.lock();
            let started = core.lifecycle.apply(LifecycleEvent::Shutdown)?;
            let completed = core.lifecycle.apply(LifecycleEvent::ShutdownComplete)?;
            core.end_session();
            (started, completed)
        };

        info!("reader shut down");
        self.emit([
            ReaderEvent::StateChanged(started),
            ReaderEvent::StateChanged(completed.clone()),
        ]);
        Ok(completed)
    }

    /// Move to `Error` from any state.
    pub fn fault(&self, error: impl fmt::Display) -> StateTransition {
        let message = error.to_string();
        let transition = self.lock().lifecycle.fault(message.clone());

        warn!(from = %transition.from, "reader fault: {}", message);
        self.emit([ReaderEvent::StateChanged(transition.clone())]);
        transition
    }

    /// Leave `Error` for `NotInitialized`.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Error`.
    pub fn reset(&self) -> Result<StateTransition> {
        let transition = {
            let mut core = self.lock();
            let transition = core.lifecycle.reset()?;
            core.end_session();
            transition
        };

        info!("reader reset");
        self.emit([ReaderEvent::StateChanged(transition.clone())]);
        Ok(transition)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Switch regulatory region.
    ///
    /// Power, link profile, fixed-channel mode and channel are brought into
    /// the new region's limits. Setting `UNKNOWN` while the region is
    /// already `UNKNOWN` changes nothing and commits nothing.
    ///
    /// # Errors
    /// See [`update`](Self::update).
    pub async fn set_region(&self, region: RegionCode) -> Result<OperationConfig> {
        if !region.is_known() {
            let core = self.lock();
            core.lifecycle.require(CONFIGURABLE_STATES)?;
            let config = core.store.snapshot();
            if !config.region.is_known() {
                return Ok(config);
            }
        }

        let config = self.commit_with(RegionChange::Normalize, move |mut config| {
            config.region = region;
            config
        })?;
        self.synchronize().await?;
        Ok(config)
    }

    /// Switch region by name (`"FCC"`, `"etsi"`, ...).
    ///
    /// # Errors
    /// Returns `ReaderError::InvalidRegion` for an unknown name, otherwise
    /// see [`update`](Self::update).
    pub async fn set_region_name(&self, name: &str) -> Result<OperationConfig> {
        let region: RegionCode = name.parse()?;
        self.set_region(region).await
    }

    /// Set output power in tenths of dBm.
    ///
    /// # Errors
    /// See [`update`](Self::update).
    pub async fn set_power_level(&self, level: u16) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.power_level = level;
            config
        })
        .await
    }

    pub async fn set_link_profile(&self, profile: u16) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.link_profile = Some(profile);
            config
        })
        .await
    }

    pub async fn set_channel(&self, channel: u8) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.channel = channel;
            config
        })
        .await
    }

    pub async fn set_fixed_channel(&self, fixed: bool) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.fixed_channel = fixed;
            config
        })
        .await
    }

    pub async fn set_lbt_enabled(&self, enabled: bool) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.lbt_enabled = enabled;
            config
        })
        .await
    }

    pub async fn set_operation_mode(&self, mode: OperationMode) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.operation_mode = mode;
            config
        })
        .await
    }

    pub async fn set_singulation(&self, singulation: Singulation) -> Result<OperationConfig> {
        self.update(move |mut config| {
            config.singulation = singulation;
            config
        })
        .await
    }

    /// Set the inventory round duration and cycle count.
    pub async fn set_inventory_duration(&self, duration: Duration, cycles: u16) -> Result<OperationConfig> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.update(move |mut config| {
            config.inventory_duration_ms = millis;
            config.inventory_cycles = cycles;
            config
        })
        .await
    }

    /// Apply a multi-field change atomically.
    ///
    /// `mutator` receives a copy of the current configuration and returns
    /// the candidate. It may run more than once if another writer commits
    /// concurrently.
    ///
    /// Every field of the candidate is validated as written, including on a
    /// region change; use [`set_region`](Self::set_region) to switch region
    /// and have the other fields brought into its limits.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Ready`,
    /// `ReaderError::Validation` if the candidate violates an invariant, or
    /// `ReaderError::TransportFault` if the committed change could not be
    /// sent. Configuration is unchanged on the first two.
    pub async fn update<F>(&self, mutator: F) -> Result<OperationConfig>
    where
        F: Fn(OperationConfig) -> OperationConfig,
    {
        let config = self.commit_with(RegionChange::Strict, mutator)?;
        self.synchronize().await?;
        Ok(config)
    }

    /// Address subsequent configuration to radio `index`.
    ///
    /// The full configuration is sent to the newly selected radio.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Ready`,
    /// `ReaderError::Validation` if `index` is not attached, or
    /// `ReaderError::TransportFault`.
    pub async fn select_radio(&self, index: u8) -> Result<RadioAttachment> {
        let attachment = {
            let mut core = self.lock();
            core.lifecycle.require(CONFIGURABLE_STATES)?;
            let current = core
                .attachment
                .ok_or_else(|| ReaderError::validation("radio", "no radio attached"))?;
            let attachment = current.with_active(index)?;
            core.attachment = Some(attachment);
            core.invalidate_applied();
            attachment
        };

        debug!(radio = index, "active radio selected");
        self.synchronize().await?;
        Ok(attachment)
    }

    /// Send the full configuration again, e.g. after a transport retry.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Ready`, or
    /// `ReaderError::TransportFault`.
    pub async fn resend_configuration(&self) -> Result<()> {
        {
            let mut core = self.lock();
            core.lifecycle.require(CONFIGURABLE_STATES)?;
            core.invalidate_applied();
        }
        self.synchronize().await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.lock().lifecycle.current_state()
    }

    /// Capabilities of the current region.
    ///
    /// # Errors
    /// Returns `ReaderError::InvalidRegion` if the capability table has no
    /// row for the current region and family.
    pub fn capabilities(&self) -> Result<Capabilities> {
        self.lock().store.capabilities()
    }

    /// Owned copy of the current configuration.
    pub fn configuration(&self) -> OperationConfig {
        self.lock().store.snapshot()
    }

    /// Number of configuration commits so far.
    pub fn revision(&self) -> u64 {
        self.lock().store.revision()
    }

    pub fn attachment(&self) -> Option<RadioAttachment> {
        self.lock().attachment
    }

    pub fn hardware_family(&self) -> HardwareFamily {
        self.family
    }

    /// Recent lifecycle transitions, oldest first.
    pub fn history(&self) -> Vec<StateTransition> {
        self.lock().lifecycle.history().iter().cloned().collect()
    }

    pub fn last_fault(&self) -> Option<String> {
        self.lock().lifecycle.last_fault().map(str::to_owned)
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.lock().lifecycle.time_in_current_state()
    }

    /// Whether the hardware holds the current configuration.
    pub fn is_synchronized(&self) -> bool {
        let core = self.lock();
        core.applied
            .as_ref()
            .is_some_and(|(revision, _)| *revision == core.store.revision())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    // Every commit is all-or-nothing, so a panic elsewhere cannot leave the
    // core half-written.
    fn lock(&self) -> MutexGuard<'_, ReaderCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: impl IntoIterator<Item = ReaderEvent>) {
        if let Some(sink) = &self.sink {
            for event in events {
                sink.deliver(event);
            }
        }
    }

    fn transition(&self, event: LifecycleEvent) -> Result<StateTransition> {
        let transition = self.lock().lifecycle.apply(event)?;
        debug!(from = %transition.from, to = %transition.to, "lifecycle {}", event);
        self.emit([ReaderEvent::StateChanged(transition.clone())]);
        Ok(transition)
    }

    /// Optimistic validate/commit loop.
    fn commit_with<F>(&self, region_change: RegionChange, mutator: F) -> Result<OperationConfig>
    where
        F: Fn(OperationConfig) -> OperationConfig,
    {
        loop {
            let (base, revision) = {
                let core = self.lock();
                core.lifecycle.require(CONFIGURABLE_STATES)?;
                (core.store.snapshot(), core.store.revision())
            };

            let validated = ConfigurationStore::prepare(&base, revision, self.family, region_change, &mutator)
                .inspect_err(|error| debug!("configuration rejected: {}", error))?;

            let committed = {
                let mut core = self.lock();
                core.lifecycle.require(CONFIGURABLE_STATES)?;
                core.store
                    .commit(validated)
                    .map(|config| (config, core.store.revision()))
            };

            match committed {
                Ok((config, revision)) => {
                    debug!(revision, region = %config.region, power = config.power_level, "configuration committed");
                    self.emit([ReaderEvent::ConfigurationChanged {
                        config: config.clone(),
                        revision,
                    }]);
                    return Ok(config);
                }
                Err(stale) => trace!("retrying write: {}", stale),
            }
        }
    }

    /// Send whatever the hardware has not yet accepted.
    ///
    /// Sends are serialized by the send gate; the core lock is never held
    /// across the transport call. Outside `Ready` the send is deferred. A
    /// send that outlives its session or radio selection neither records
    /// its result nor faults the reader.
    async fn synchronize(&self) -> Result<()> {
        let _gate = self.send_gate.lock().await;

        let (command, revision, config, session, epoch) = {
            let core = self.lock();
            let state = core.lifecycle.current_state();
            if state != LifecycleState::Ready {
                debug!(%state, "configuration send deferred");
                return Ok(());
            }
            let Some(attachment) = core.attachment else {
                return Ok(());
            };

            let revision = core.store.revision();
            let previous = match &core.applied {
                Some((applied, _)) if *applied == revision => return Ok(()),
                Some((_, config)) => Some(config),
                None => None,
            };

            let config = core.store.snapshot();
            let mut command = config.command_from(previous, attachment.active());
            if previous.is_none() && attachment.count() > 1 {
                command.fields.insert(0, ConfigField::ActiveRadio(attachment.active()));
            }
            (command, revision, config, core.session, core.epoch)
        };

        if !command.is_empty() {
            if let Err(error) = self.transport.send_configuration_command(&command).await {
                return Err(self.transport_fault(error, session));
            }
            debug!(
                radio = command.radio,
                transport = self.transport.kind(),
                fields = %command.field_names(),
                "configuration applied"
            );
        }

        {
            let mut core = self.lock();
            if core.epoch == epoch && core.lifecycle.current_state() == LifecycleState::Ready {
                core.applied = Some((revision, config));
            } else {
                debug!(revision, "stale send not recorded");
            }
        }

        if !command.is_empty() {
            self.emit([ReaderEvent::ConfigurationApplied {
                radio: command.radio,
                fields: command.fields,
            }]);
        }
        Ok(())
    }

    fn transport_fault(&self, error: TransportError, session: u64) -> ReaderError {
        let message = error.to_string();
        let transition = {
            let mut core = self.lock();
            if core.session != session {
                debug!("transport failure from an ended session: {}", message);
                return ReaderError::TransportFault(error);
            }
            core.lifecycle.fault(message.clone())
        };

        warn!(transport = self.transport.kind(), "transport fault: {}", message);
        self.emit([
            ReaderEvent::StateChanged(transition),
            ReaderEvent::TransportFault { message },
        ]);
        ReaderError::TransportFault(error)
    }
}

impl fmt::Debug for ReaderFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderFacade")
            .field("family", &self.family)
            .field("transport", &self.transport.kind())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
