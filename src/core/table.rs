//! Declarative transition table for the counter machine.
//!
//! Each edge names its source and target state, a guard over the current
//! context, the register action it performs and the number of clock
//! cycles it consumes. Edges are evaluated in insertion order and the
//! first one whose source matches and whose guard passes is taken.

use super::guard::Guard;
use super::registers::{Countdown, Direction, Nibble, PinLevel, Registers};
use super::state::{CounterState, State};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Cycles spent in the program preamble that loads the initial registers.
pub const PREAMBLE_CYCLES: u32 = 2;
/// `Begin`: display, snapshot (three instructions) and countdown load.
pub const BEGIN_CYCLES: u32 = 5;
/// Pin check or countdown decrement: one instruction plus 31 delay cycles.
pub const PIN_CHECK_CYCLES: u32 = 32;
/// A full delay tick. The same whether or not a press is pending.
pub const DELAY_TICK_CYCLES: u32 = 2 * PIN_CHECK_CYCLES;
/// One stalled release-wait sample.
pub const RELEASE_POLL_CYCLES: u32 = 1;
/// Release seen: wait, flip, restore, dispatch.
pub const TOGGLE_DISPATCH_CYCLES: u32 = 4;
pub const EXPIRED_TO_DECREMENT_CYCLES: u32 = 2;
pub const EXPIRED_TO_INCREMENT_CYCLES: u32 = 3;
/// Complement, decrement, complement, jump.
pub const INCREMENT_CYCLES: u32 = 4;
pub const DECREMENT_CYCLES: u32 = 1;
/// Decrementing from zero falls through to the preamble, which reloads
/// counter 15 and direction decrement.
pub const DECREMENT_WRAP_CYCLES: u32 = DECREMENT_CYCLES + PREAMBLE_CYCLES;

/// Everything a guard may look at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TransitionContext {
    pub state: CounterState,
    pub toggle: PinLevel,
    pub registers: Registers,
}

/// Register update performed when an edge is taken.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Action {
    /// Drive the counter onto the outputs, snapshot it, reload the countdown.
    ShowAndArm,
    CountDown,
    /// No register change.
    Hold,
    /// Restore the counter from the snapshot.
    Restore,
    /// Flip direction, then restore the counter from the snapshot.
    FlipAndRestore,
    Increment,
    Decrement,
}

impl Action {
    /// Apply this action to a register file (pure).
    pub fn apply(self, registers: Registers) -> Registers {
        let mut next = registers;
        match self {
            Self::ShowAndArm => {
                next.saved = registers.counter;
                next.countdown = Countdown::reload();
            }
            Self::CountDown => next.countdown = registers.countdown.tick(),
            Self::Hold => {}
            Self::Restore => next.counter = registers.saved,
            Self::FlipAndRestore => {
                next.direction = registers.direction.toggled();
                next.counter = registers.saved;
            }
            Self::Increment => next.counter = registers.counter.increment(),
            Self::Decrement => next.counter = registers.counter.decrement(),
        }
        next
    }

    /// Whether taking this edge writes the output pins.
    pub fn displays(self) -> bool {
        matches!(self, Self::ShowAndArm)
    }
}

/// Errors that can occur when selecting a transition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("No transition available from state '{from}'")]
    NoTransition { from: String },
}

/// A guarded edge of the transition table.
#[derive(Clone, Debug)]
pub struct Edge {
    pub from: CounterState,
    pub to: CounterState,
    pub guard: Guard<TransitionContext>,
    pub action: Action,
    pub cycles: u32,
}

impl Edge {
    pub fn new(from: CounterState, to: CounterState, action: Action, cycles: u32) -> Self {
        Self {
            from,
            to,
            guard: Guard::always(),
            action,
            cycles,
        }
    }

    /// Restrict this edge with a guard.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TransitionContext) -> bool + Send + Sync + 'static,
    {
        self.guard = Guard::new(predicate);
        self
    }

    /// Check if this edge can be taken in the given context (pure).
    pub fn can_execute(&self, context: &TransitionContext) -> bool {
        context.state == self.from && self.guard.check(context)
    }
}

/// Ordered list of guarded edges.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    edges: Vec<Edge>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Append an edge. Earlier edges take priority.
    pub fn edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Pick the first edge that can execute in `context`.
    pub fn select(&self, context: &TransitionContext) -> Result<&Edge, TransitionError> {
        self.edges
            .iter()
            .find(|edge| edge.can_execute(context))
            .ok_or_else(|| TransitionError::NoTransition {
                from: context.state.name().to_string(),
            })
    }

    /// The counter/toggle program.
    ///
    /// The pin check in `Delay` is listed before the countdown edges, so a
    /// press always wins over an expiring countdown in the same tick.
    pub fn standard() -> &'static TransitionTable {
        static TABLE: OnceLock<TransitionTable> = OnceLock::new();
        TABLE.get_or_init(Self::build_standard)
    }

    fn build_standard() -> TransitionTable {
        use CounterState::*;

        let pressed = |ctx: &TransitionContext| ctx.toggle.is_asserted();
        let decrementing = |ctx: &TransitionContext| ctx.registers.direction == Direction::Decrement;
        let incrementing = |ctx: &TransitionContext| ctx.registers.direction == Direction::Increment;

        TransitionTable::new()
            .edge(Edge::new(Begin, Delay, Action::ShowAndArm, BEGIN_CYCLES))
            .edge(Edge::new(Delay, TogglePress, Action::Hold, PIN_CHECK_CYCLES).when(pressed))
            .edge(
                Edge::new(Delay, Delay, Action::CountDown, DELAY_TICK_CYCLES)
                    .when(|ctx| !ctx.registers.countdown.is_expired()),
            )
            .edge(Edge::new(
                Delay,
                ApplyDelayExpired,
                Action::Hold,
                DELAY_TICK_CYCLES,
            ))
            .edge(
                Edge::new(
                    ApplyDelayExpired,
                    Decrement,
                    Action::Restore,
                    EXPIRED_TO_DECREMENT_CYCLES,
                )
                .when(decrementing),
            )
            .edge(
                Edge::new(
                    ApplyDelayExpired,
                    Increment,
                    Action::Restore,
                    EXPIRED_TO_INCREMENT_CYCLES,
                )
                .when(incrementing),
            )
            .edge(
                Edge::new(TogglePress, TogglePress, Action::Hold, RELEASE_POLL_CYCLES)
                    .when(pressed),
            )
            // Dispatch follows the direction after the flip.
            .edge(
                Edge::new(
                    TogglePress,
                    Increment,
                    Action::FlipAndRestore,
                    TOGGLE_DISPATCH_CYCLES,
                )
                .when(decrementing),
            )
            .edge(
                Edge::new(
                    TogglePress,
                    Decrement,
                    Action::FlipAndRestore,
                    TOGGLE_DISPATCH_CYCLES,
                )
                .when(incrementing),
            )
            .edge(Edge::new(Increment, Begin, Action::Increment, INCREMENT_CYCLES))
            .edge(
                Edge::new(Decrement, Begin, Action::Decrement, DECREMENT_CYCLES)
                    .when(|ctx| ctx.registers.counter != Nibble::ZERO),
            )
            .edge(Edge::new(
                Decrement,
                Begin,
                Action::Decrement,
                DECREMENT_WRAP_CYCLES,
            ))
    }
}
