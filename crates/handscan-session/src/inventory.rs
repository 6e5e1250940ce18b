//! Inventory controller.
//!
//! A two-state machine driven by the handheld trigger:
//!
//! - `Idle` + press → issue start, enter `Scanning`
//! - `Scanning` + release → issue stop, enter `Idle`
//! - any other combination is a no-op
//!
//! The controller only decides; the caller issues the returned command to the
//! driver. The state follows the trigger, not the outcome of that command.
//!
//! # Examples
//!
//! ```
//! use handscan_hardware::TriggerEvent;
//! use handscan_session::{InventoryCommand, InventoryController, InventoryState};
//!
//! let mut controller = InventoryController::new();
//! assert_eq!(controller.on_trigger(TriggerEvent::Pressed), Some(InventoryCommand::Start));
//! assert_eq!(controller.on_trigger(TriggerEvent::Pressed), None);
//! assert_eq!(controller.current_state(), InventoryState::Scanning);
//!
//! assert_eq!(controller.on_trigger(TriggerEvent::Released), Some(InventoryCommand::Stop));
//! assert_eq!(controller.current_state(), InventoryState::Idle);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use handscan_core::constants::MAX_TRANSITION_HISTORY;
use handscan_hardware::TriggerEvent;
use serde::{Deserialize, Serialize};

/// Inventory state of the active reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryState {
    /// No scan in progress.
    #[default]
    Idle,

    /// Inventory running on the reader.
    Scanning,
}

impl fmt::Display for InventoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryState::Idle => write!(f, "IDLE"),
            InventoryState::Scanning => write!(f, "SCANNING"),
        }
    }
}

/// Driver command the controller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryCommand {
    Start,
    Stop,
}

/// A recorded state change.
///
/// `trigger` is `None` for forced resets (disconnect, reader lost).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: InventoryState,
    pub to: InventoryState,
    pub trigger: Option<TriggerEvent>,

    /// Not serialized; set to the time of deserialization when read back.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: InventoryState, to: InventoryState, trigger: Option<TriggerEvent>) -> Self {
        Self {
            from,
            to,
            trigger,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Trigger-driven IDLE/SCANNING state machine.
///
/// Not synchronized; the session keeps it behind a `tokio::sync::Mutex`.
#[derive(Debug)]
pub struct InventoryController {
    state: InventoryState,
    history: VecDeque<StateTransition>,
    starts: u64,
    stops: u64,
}

impl InventoryController {
    pub fn new() -> Self {
        Self {
            state: InventoryState::Idle,
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
            starts: 0,
            stops: 0,
        }
    }

    pub fn current_state(&self) -> InventoryState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == InventoryState::Scanning
    }

    /// Apply a trigger event, returning the command to issue, if any.
    pub fn on_trigger(&mut self, event: TriggerEvent) -> Option<InventoryCommand> {
        let (next, command) = match (self.state, event) {
            (InventoryState::Idle, TriggerEvent::Pressed) => {
                (InventoryState::Scanning, InventoryCommand::Start)
            }
            (InventoryState::Scanning, TriggerEvent::Released) => {
                (InventoryState::Idle, InventoryCommand::Stop)
            }
            _ => return None,
        };

        match command {
            InventoryCommand::Start => self.starts += 1,
            InventoryCommand::Stop => self.stops += 1,
        }
        self.change_state(next, Some(event));
        Some(command)
    }

    /// Force the machine back to `Idle` without issuing a command.
    ///
    /// Returns the transition, or `None` if already idle.
    pub fn reset(&mut self) -> Option<StateTransition> {
        if self.state == InventoryState::Idle {
            return None;
        }
        Some(self.change_state(InventoryState::Idle, None))
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Start commands issued so far.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Stop commands issued so far.
    pub fn stops(&self) -> u64 {
        self.stops
    }

    fn change_state(
        &mut self,
        next: InventoryState,
        trigger: Option<TriggerEvent>,
    ) -> StateTransition {
        let transition = StateTransition::new(self.state, next, trigger);
        self.state = next;

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
        transition
    }
}

impl Default for InventoryController {
    fn default() -> Self {
        Self::new()
    }
}
