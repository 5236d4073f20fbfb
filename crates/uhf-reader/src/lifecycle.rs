//! Reader lifecycle state machine.
//!
//! Tracks where the reader is between power-up and shutdown and decides
//! which operations are legal in each state.
//!
//! # States
//!
//! - `NotInitialized`: nothing attached, no session
//! - `Initializing`: session started, waiting for radio attachment
//! - `Ready`: radios attached, configuration may change
//! - `Operating`: inventory running, configuration frozen
//! - `ShuttingDown`: session being torn down
//! - `Error`: a fault occurred; only `reset` leaves this state
//!
//! # Valid Transitions
//!
//! ```text
//! NotInitialized --Initialize-->        Initializing
//! Initializing   --AttachSucceeded-->   Ready
//! Initializing   --AttachFailed-->      Error
//! Ready          --BeginOperation-->    Operating
//! Operating      --EndOperation-->      Ready
//! Ready|Operating--Shutdown-->          ShuttingDown
//! ShuttingDown   --ShutdownComplete-->  NotInitialized
//! any            --Fault-->             Error
//! Error          --Reset-->             NotInitialized
//! ```
//!
//! # Examples
//!
//! ```
//! use uhf_core::LifecycleState;
//! use uhf_reader::lifecycle::{LifecycleEvent, LifecycleStateMachine};
//!
//! let mut machine = LifecycleStateMachine::new();
//! machine.apply(LifecycleEvent::Initialize).unwrap();
//! machine.apply(LifecycleEvent::AttachSucceeded).unwrap();
//! assert_eq!(machine.current_state(), LifecycleState::Ready);
//!
//! // Invalid transition
//! assert!(machine.apply(LifecycleEvent::EndOperation).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uhf_core::{LifecycleState, ReaderError, Result, constants::MAX_HISTORY_SIZE};

/// States in which configuration may be changed.
pub const CONFIGURABLE_STATES: &[LifecycleState] = &[LifecycleState::Ready];

/// Something that moves the reader from one lifecycle state to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Initialize,
    AttachSucceeded,
    AttachFailed,
    BeginOperation,
    EndOperation,
    Shutdown,
    ShutdownComplete,
    Fault,
    Reset,
}

impl LifecycleEvent {
    /// State reached by applying this event in `from`, if legal.
    pub fn target(&self, from: LifecycleState) -> Option<LifecycleState> {
        use LifecycleState as S;

        match (self, from) {
            (Self::Initialize, S::NotInitialized) => Some(S::Initializing),
            (Self::AttachSucceeded, S::Initializing) => Some(S::Ready),
            (Self::AttachFailed, S::Initializing) => Some(S::Error),
            (Self::BeginOperation, S::Ready) => Some(S::Operating),
            (Self::EndOperation, S::Operating) => Some(S::Ready),
            (Self::Shutdown, S::Ready | S::Operating) => Some(S::ShuttingDown),
            (Self::ShutdownComplete, S::ShuttingDown) => Some(S::NotInitialized),
            (Self::Fault, _) => Some(S::Error),
            (Self::Reset, S::Error) => Some(S::NotInitialized),
            _ => None,
        }
    }

    /// States from which this event is legal.
    pub fn source_states(&self) -> &'static [LifecycleState] {
        use LifecycleState as S;

        match self {
            Self::Initialize => &[S::NotInitialized],
            Self::AttachSucceeded | Self::AttachFailed => &[S::Initializing],
            Self::BeginOperation => &[S::Ready],
            Self::EndOperation => &[S::Operating],
            Self::Shutdown => &[S::Ready, S::Operating],
            Self::ShutdownComplete => &[S::ShuttingDown],
            Self::Fault => &[
                S::NotInitialized,
                S::Initializing,
                S::Ready,
                S::Operating,
                S::ShuttingDown,
                S::Error,
            ],
            Self::Reset => &[S::Error],
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single lifecycle transition with its wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub event: LifecycleEvent,
    pub at: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: LifecycleState, to: LifecycleState, event: LifecycleEvent) -> Self {
        Self {
            from,
            to,
            event,
            at: Utc::now(),
        }
    }
}

/// Lifecycle state machine with bounded transition history.
///
/// # Thread Safety
///
/// This struct is not synchronized. The reader façade keeps it behind the
/// same lock as the configuration store so that a transition and a
/// configuration commit can never interleave.
#[derive(Debug)]
pub struct LifecycleStateMachine {
    current_state: LifecycleState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
    last_fault: Option<String>,
}

impl LifecycleStateMachine {
    /// Create a new state machine in `NotInitialized`.
    pub fn new() -> Self {
        Self {
            current_state: LifecycleState::NotInitialized,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            last_fault: None,
        }
    }

    pub fn current_state(&self) -> LifecycleState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Message of the most recent fault, kept until the next `Reset`.
    pub fn last_fault(&self) -> Option<&str> {
        self.last_fault.as_deref()
    }

    /// Fail unless the current state is one of `allowed`.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` naming the current state
    /// and the allowed set.
    pub fn require(&self, allowed: &[LifecycleState]) -> Result<()> {
        if allowed.contains(&self.current_state) {
            Ok(())
        } else {
            Err(ReaderError::illegal_state(self.current_state, allowed))
        }
    }

    /// Apply `event`, validating it against the transition table.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` if the event is not legal
    /// in the current state; the state is left unchanged.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<StateTransition> {
        let target = event
            .target(self.current_state)
            .ok_or_else(|| ReaderError::illegal_state(self.current_state, event.source_states()))?;

        let transition = StateTransition::new(self.current_state, target, event);
        self.perform_state_change(transition.clone());
        Ok(transition)
    }

    /// Move to `Error` from any state, remembering `message`.
    pub fn fault(&mut self, message: impl Into<String>) -> StateTransition {
        self.last_fault = Some(message.into());
        let transition =
            StateTransition::new(self.current_state, LifecycleState::Error, LifecycleEvent::Fault);
        self.perform_state_change(transition.clone());
        transition
    }

    /// Record a failed radio attachment and move to `Error`.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Initializing`.
    pub fn fail_attach(&mut self, message: impl Into<String>) -> Result<StateTransition> {
        let transition = self.apply(LifecycleEvent::AttachFailed)?;
        self.last_fault = Some(message.into());
        Ok(transition)
    }

    /// Leave `Error` for `NotInitialized`, clearing the fault message.
    ///
    /// # Errors
    /// Returns `ReaderError::IllegalStateTransition` outside `Error`.
    pub fn reset(&mut self) -> Result<StateTransition> {
        let transition = self.apply(LifecycleEvent::Reset)?;
        self.last_fault = None;
        Ok(transition)
    }

    fn perform_state_change(&mut self, transition: StateTransition) {
        self.current_state = transition.to;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for LifecycleStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
