//! State transition history tracking.
//!
//! Provides a bounded, immutable trace of state machine transitions. Each
//! record is stamped with the machine cycle at which the transition
//! started, so durations are exact at any clock frequency.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::{CounterState, StateTransition};
///
/// let transition = StateTransition {
///     from: CounterState::Begin,
///     to: CounterState::Delay,
///     cycle: 2,
///     cycles: 5,
/// };
/// assert_eq!(transition.end_cycle(), 7);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Machine cycle at which the step started
    pub cycle: u64,
    /// Clock cycles the step consumed
    pub cycles: u32,
}

impl<S: State> StateTransition<S> {
    pub fn end_cycle(&self) -> u64 {
        self.cycle + u64::from(self.cycles)
    }
}

/// Ordered history of the most recent state transitions.
///
/// History is immutable - the `record` method returns a new history with
/// the transition added. Once `capacity` records are held, the oldest is
/// dropped.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::{CounterState, StateHistory, StateTransition};
///
/// let history = StateHistory::with_capacity(8);
/// let history = history.record(StateTransition {
///     from: CounterState::Begin,
///     to: CounterState::Delay,
///     cycle: 2,
///     cycles: 5,
/// });
/// let history = history.record(StateTransition {
///     from: CounterState::Delay,
///     to: CounterState::TogglePress,
///     cycle: 7,
///     cycles: 32,
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // Begin -> Delay -> TogglePress
/// assert_eq!(history.span(), Some(37));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    capacity: usize,
    transitions: VecDeque<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a new empty history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new empty history holding at most `capacity` records.
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// This is a pure function - it does not mutate the existing history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        if transitions.len() == self.capacity {
            transitions.pop_front();
        }
        transitions.push_back(transition);
        Self {
            capacity: self.capacity,
            transitions,
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the oldest retained transition followed
    /// by the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Cycles from the start of the oldest retained transition to the end
    /// of the newest. `None` if there are no transitions.
    pub fn span(&self) -> Option<u64> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        Some(last.end_cycle().saturating_sub(first.cycle))
    }

    /// Wall-clock duration of [`span`](Self::span) at `frequency_hz`.
    pub fn duration(&self, frequency_hz: u32) -> Option<Duration> {
        if frequency_hz == 0 {
            return None;
        }
        let cycles = self.span()?;
        let nanos = u128::from(cycles) * 1_000_000_000 / u128::from(frequency_hz);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Iterate over retained transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<S>> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CounterState;

    fn transition(from: CounterState, to: CounterState, cycle: u64, cycles: u32) -> StateTransition<CounterState> {
        StateTransition {
            from,
            to,
            cycle,
            cycles,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<CounterState> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.span().is_none());
        assert!(history.duration(2000).is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();
        let new_history = history.record(transition(CounterState::Begin, CounterState::Delay, 2, 5));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(transition(CounterState::Begin, CounterState::Delay, 2, 5))
            .record(transition(CounterState::Delay, CounterState::Delay, 7, 64));

        let path = history.get_path();
        assert_eq!(
            path,
            vec![&CounterState::Begin, &CounterState::Delay, &CounterState::Delay]
        );
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = StateHistory::with_capacity(2);
        history = history.record(transition(CounterState::Begin, CounterState::Delay, 2, 5));
        history = history.record(transition(CounterState::Delay, CounterState::TogglePress, 7, 32));
        history = history.record(transition(CounterState::TogglePress, CounterState::Increment, 39, 4));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get_path()[0], &CounterState::Delay);
        assert_eq!(history.span(), Some(43 - 7));
    }

    #[test]
    fn zero_capacity_keeps_one_record() {
        let history = StateHistory::with_capacity(0)
            .record(transition(CounterState::Begin, CounterState::Delay, 2, 5));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn duration_uses_clock_frequency() {
        let history = StateHistory::new()
            .record(transition(CounterState::Begin, CounterState::Delay, 0, 1000));

        assert_eq!(history.duration(2000), Some(Duration::from_millis(500)));
        assert_eq!(history.duration(0), None);
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StateHistory::new()
            .record(transition(CounterState::Begin, CounterState::Delay, 2, 5));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<CounterState> = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
