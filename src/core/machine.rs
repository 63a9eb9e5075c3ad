//! The pure counter machine.
//!
//! [`CounterCore`] is a plain value: advancing it returns a new value and
//! never touches pins. The effect runner and the hardware driver both
//! wrap it and supply the toggle level sampled at the start of each step.

use super::registers::{Direction, Nibble, PinLevel, Registers};
use super::state::CounterState;
use super::history::StateTransition;
use super::table::{TransitionContext, TransitionError, TransitionTable, PREAMBLE_CYCLES};
use serde::{Deserialize, Serialize};

/// Snapshot of the logical machine: current state, registers and clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CounterCore {
    state: CounterState,
    registers: Registers,
    cycle: u64,
}

/// Result of one step of the core.
#[derive(Clone, PartialEq, Debug)]
pub struct Advance {
    /// The machine after the step.
    pub next: CounterCore,
    /// Value written to the output pins at the start of the step, if any.
    pub display: Option<Nibble>,
    /// Set when this step flipped the direction.
    pub flipped: bool,
    /// Transition record for this step.
    pub transition: StateTransition<CounterState>,
}

impl Default for CounterCore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterCore {
    /// Machine at `Begin` with counter 15, decrementing, after the
    /// register-loading preamble.
    pub fn new() -> Self {
        Self {
            state: CounterState::Begin,
            registers: Registers::default(),
            cycle: u64::from(PREAMBLE_CYCLES),
        }
    }

    /// Rebuild a core from its parts, e.g. when resuming a checkpoint.
    pub fn from_parts(state: CounterState, registers: Registers, cycle: u64) -> Self {
        Self {
            state,
            registers,
            cycle,
        }
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn counter(&self) -> Nibble {
        self.registers.counter
    }

    pub fn direction(&self) -> Direction {
        self.registers.direction
    }

    /// Clock cycle at which the next step starts.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Take one step through the standard table.
    ///
    /// `toggle` is the level of the toggle pin at [`cycle`](Self::cycle);
    /// it is ignored by states that do not sample the pin.
    pub fn advance(&self, toggle: PinLevel) -> Result<Advance, TransitionError> {
        self.advance_with(TransitionTable::standard(), toggle)
    }

    /// Take one step through an arbitrary table.
    pub fn advance_with(
        &self,
        table: &TransitionTable,
        toggle: PinLevel,
    ) -> Result<Advance, TransitionError> {
        let toggle = if self.state.samples_toggle() {
            toggle
        } else {
            PinLevel::Low
        };
        let context = TransitionContext {
            state: self.state,
            toggle,
            registers: self.registers,
        };
        let edge = table.select(&context)?;

        let registers = edge.action.apply(self.registers);
        let next = CounterCore {
            state: edge.to,
            registers,
            cycle: self.cycle + u64::from(edge.cycles),
        };

        Ok(Advance {
            next,
            display: edge.action.displays().then_some(self.registers.counter),
            flipped: registers.direction != self.registers.direction,
            transition: StateTransition {
                from: self.state,
                to: edge.to,
                cycle: self.cycle,
                cycles: edge.cycles,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{
        BEGIN_CYCLES, DECREMENT_CYCLES, DELAY_TICK_CYCLES, EXPIRED_TO_DECREMENT_CYCLES,
    };

    fn run_until_display(mut core: CounterCore, toggle: PinLevel) -> (CounterCore, Nibble) {
        loop {
            let advance = core.advance(toggle).unwrap();
            core = advance.next;
            if let Some(value) = advance.display {
                return (core, value);
            }
        }
    }

    #[test]
    fn starts_at_begin_with_fifteen() {
        let core = CounterCore::new();
        assert_eq!(core.state(), CounterState::Begin);
        assert_eq!(core.counter(), Nibble::MAX);
        assert_eq!(core.direction(), Direction::Decrement);
        assert_eq!(core.cycle(), 2);
    }

    #[test]
    fn begin_displays_current_counter() {
        let advance = CounterCore::new().advance(PinLevel::Low).unwrap();
        assert_eq!(advance.display, Some(Nibble::MAX));
        assert_eq!(advance.next.state(), CounterState::Delay);
        assert_eq!(advance.transition.cycle, 2);
    }

    #[test]
    fn begin_ignores_toggle_level() {
        let low = CounterCore::new().advance(PinLevel::Low).unwrap();
        let high = CounterCore::new().advance(PinLevel::High).unwrap();
        assert_eq!(low, high);
    }

    #[test]
    fn full_decrement_period_is_2056_cycles() {
        let (core, first) = run_until_display(CounterCore::new(), PinLevel::Low);
        assert_eq!(first, Nibble::MAX);
        let start = core.cycle() - u64::from(BEGIN_CYCLES);

        let mut core = core;
        loop {
            let advance = core.advance(PinLevel::Low).unwrap();
            if advance.display.is_some() {
                assert_eq!(advance.display.unwrap().value(), 14);
                assert_eq!(advance.transition.cycle - start, 2056);
                assert_eq!(
                    u64::from(BEGIN_CYCLES + 32 * DELAY_TICK_CYCLES + EXPIRED_TO_DECREMENT_CYCLES + DECREMENT_CYCLES),
                    2056
                );
                break;
            }
            core = advance.next;
        }
    }

    #[test]
    fn press_restores_snapshot_and_flips() {
        let mut core = CounterCore::new().advance(PinLevel::Low).unwrap().next;
        // a few idle ticks, then a press
        for _ in 0..3 {
            core = core.advance(PinLevel::Low).unwrap().next;
        }
        let pressed = core.advance(PinLevel::High).unwrap();
        assert_eq!(pressed.next.state(), CounterState::TogglePress);
        assert!(!pressed.flipped);

        let held = pressed.next.advance(PinLevel::High).unwrap();
        assert_eq!(held.next.state(), CounterState::TogglePress);
        assert_eq!(held.transition.cycles, 1);

        let released = held.next.advance(PinLevel::Low).unwrap();
        assert!(released.flipped);
        assert_eq!(released.next.state(), CounterState::Increment);
        assert_eq!(released.next.counter(), Nibble::MAX);
        assert_eq!(released.next.direction(), Direction::Increment);

        let incremented = released.next.advance(PinLevel::Low).unwrap();
        assert_eq!(incremented.next.counter(), Nibble::ZERO);
        assert_eq!(incremented.next.state(), CounterState::Begin);
    }

    #[test]
    fn decrement_from_zero_wraps_through_preamble() {
        let registers = Registers {
            counter: Nibble::ZERO,
            ..Registers::default()
        };
        let core = CounterCore::from_parts(CounterState::Decrement, registers, 100);
        let advance = core.advance(PinLevel::Low).unwrap();
        assert_eq!(advance.next.counter(), Nibble::MAX);
        assert_eq!(advance.next.cycle(), 103);
    }

    #[test]
    fn empty_table_is_an_error() {
        let result = CounterCore::new().advance_with(&TransitionTable::new(), PinLevel::Low);
        assert!(matches!(result, Err(TransitionError::NoTransition { .. })));
    }

    #[test]
    fn core_serializes_correctly() {
        let core = CounterCore::new().advance(PinLevel::Low).unwrap().next;
        let json = serde_json::to_string(&core).unwrap();
        let deserialized: CounterCore = serde_json::from_str(&json).unwrap();
        assert_eq!(core, deserialized);
    }
}
