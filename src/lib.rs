//! Toggle counter: a 4-bit binary LED counter with a direction button.
//!
//! The counter starts at 15 and counts down once per delay phase of 2048
//! cycles, showing its value on four output pins. Pressing the button
//! during a delay phase reverses the direction once the button is
//! released. The machine is built on the "pure core, imperative shell"
//! split:
//!
//! - [`core`]: the pure counter machine, a table of guarded transitions
//!   with exact cycle costs
//! - [`pio`]: a cycle-accurate simulator of the instruction program the
//!   counter runs on programmable I/O hardware
//! - [`effects`]: the core wrapped in Stillwater effects over a [`Board`]
//! - [`driver`]: the core on real pins through `embedded-hal` 1.0
//! - [`config`] and [`checkpoint`]: validated configuration and resumable
//!   snapshots
//!
//! # Example
//!
//! ```rust
//! use toggle_counter::core::{CounterCore, PinLevel};
//!
//! let mut core = CounterCore::new();
//! let mut shown = Vec::new();
//! while shown.len() < 4 {
//!     let advance = core.advance(PinLevel::Low).unwrap();
//!     if let Some(value) = advance.display {
//!         shown.push(value.value());
//!     }
//!     core = advance.next;
//! }
//! assert_eq!(shown, vec![15, 14, 13, 12]);
//! ```

pub mod checkpoint;
pub mod config;
pub mod core;
pub mod driver;
pub mod effects;
pub mod pio;
pub mod stimulus;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::{ConfigBuilder, ConfigError, MachineConfig};
pub use self::core::{CounterCore, CounterState, Direction, Nibble, PinLevel, State};
pub use driver::{DriverError, ToggleCounter};
pub use effects::{Board, CounterStateMachine, MachineError, SimulatedBoard};
pub use pio::{PioStateMachine, Program};
pub use stimulus::{ButtonScript, Frame};
