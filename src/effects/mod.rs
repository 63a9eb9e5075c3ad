//! Effectful counter operations using Stillwater 0.11.0.
//!
//! This module is the imperative shell around the pure core: it samples
//! the toggle pin and writes the display through a [`Board`] environment.
//!
//! # Zero-Cost Abstractions
//!
//! Following Stillwater 0.11.0 conventions:
//! - `step()` returns `impl Effect`; it is built from `from_fn()` or `fail()`
//! - board access happens only when the effect is run with an environment
//! - `apply_result()` commits the pure outcome afterwards

mod board;
mod machine;

pub use board::{Board, BoardError, SimulatedBoard};
pub use machine::{CounterStateMachine, Lifecycle, MachineError};
