//! State trait and the six states of the counter machine.
//!
//! All state machine states implement [`State`], which provides pure
//! methods for inspecting state properties without side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// # Required Traits
///
/// - `Clone`: states are copied into the transition history
/// - `PartialEq`: transition edges match on the source state
/// - `Debug`: states show up in logs and errors
/// - `Serialize` + `Deserialize`: states are stored in checkpoints
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Position of the counter machine within one display/delay/update cycle.
///
/// The machine has no terminal state: it loops through these forever until
/// the host stops it.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::{CounterState, State};
///
/// assert_eq!(CounterState::default(), CounterState::Begin);
/// assert!(CounterState::Delay.samples_toggle());
/// assert!(!CounterState::Increment.samples_toggle());
/// assert!(!CounterState::Begin.is_final());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum CounterState {
    /// Show the counter, snapshot it and load a fresh countdown.
    #[default]
    Begin,
    /// One delay tick: check the toggle pin, then count down.
    Delay,
    /// Button seen pressed; wait for release, then flip direction.
    TogglePress,
    /// Countdown ran out without a press.
    ApplyDelayExpired,
    Increment,
    Decrement,
}

impl CounterState {
    pub const ALL: [CounterState; 6] = [
        Self::Begin,
        Self::Delay,
        Self::TogglePress,
        Self::ApplyDelayExpired,
        Self::Increment,
        Self::Decrement,
    ];

    /// Whether the step taken from this state reads the toggle pin.
    pub fn samples_toggle(&self) -> bool {
        matches!(self, Self::Delay | Self::TogglePress)
    }
}

impl State for CounterState {
    fn name(&self) -> &str {
        match self {
            Self::Begin => "Begin",
            Self::Delay => "Delay",
            Self::TogglePress => "TogglePress",
            Self::ApplyDelayExpired => "ApplyDelayExpired",
            Self::Increment => "Increment",
            Self::Decrement => "Decrement",
        }
    }
}
