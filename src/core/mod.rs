//! Core state machine types and logic.
//!
//! This module contains the pure core of the counter:
//! - register values (`Nibble`, `Direction`, `Countdown`, `PinLevel`)
//! - the six counter states via the `State` trait
//! - guarded transition edges with cycle costs
//! - the `CounterCore` value that steps through them
//! - bounded history tracking
//!
//! Nothing in this module performs I/O.

mod guard;
mod history;
mod machine;
mod registers;
mod state;
mod table;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use machine::{Advance, CounterCore};
pub use registers::{Countdown, Direction, Nibble, PinLevel, Registers};
pub use state::{CounterState, State};
pub use table::{
    Action, Edge, TransitionContext, TransitionError, TransitionTable, BEGIN_CYCLES,
    DECREMENT_CYCLES, DECREMENT_WRAP_CYCLES, DELAY_TICK_CYCLES, EXPIRED_TO_DECREMENT_CYCLES,
    EXPIRED_TO_INCREMENT_CYCLES, INCREMENT_CYCLES, PIN_CHECK_CYCLES, PREAMBLE_CYCLES,
    RELEASE_POLL_CYCLES, TOGGLE_DISPATCH_CYCLES,
};
