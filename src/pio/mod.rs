//! Cycle-accurate simulation of the counter on programmable I/O hardware.
//!
//! The logical machine in [`crate::core`] abstracts over instructions.
//! This module runs the actual instruction program, register by register
//! and cycle by cycle, so its timing can be checked against the cycle
//! costs in the core's transition table.
//!
//! # Example
//!
//! ```rust
//! use toggle_counter::config::MachineConfig;
//! use toggle_counter::pio::PioStateMachine;
//! use toggle_counter::stimulus::{values, ButtonScript};
//!
//! let mut sm = PioStateMachine::toggle_binary(&MachineConfig::default());
//! let frames = sm.run_script(&ButtonScript::new(), 5_000);
//! assert_eq!(values(&frames), vec![15, 14, 13]);
//! ```

mod instruction;
mod machine;
mod program;

pub use instruction::{
    InSource, Instruction, JmpCondition, MovDestination, MovOp, MovSource, Operation,
    OutDestination, SetDestination, WaitSource,
};
pub use machine::{PinMapping, PioStateMachine, ShiftConfig, ShiftDirection};
pub use program::{
    AssemblyError, Program, ProgramBuilder, MAX_DELAY, MAX_PROGRAM_LEN, MAX_SET_DATA,
};
