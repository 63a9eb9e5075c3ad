//! Machine configuration.
//!
//! The configuration is fixed once the machine starts: clock frequency,
//! toggle input pin, first of the four output pins and the history size.
//! Validation uses Stillwater's `Validation` so that every broken rule is
//! reported together.
//!
//! # Example
//!
//! ```rust
//! use toggle_counter::config::{ConfigBuilder, ConfigError};
//!
//! let config = ConfigBuilder::new()
//!     .frequency(2000)
//!     .toggle_pin(15)
//!     .out_base(0)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.cycles_to_nanos(2), 1_000_000);
//!
//! let err = ConfigBuilder::new()
//!     .frequency(10)
//!     .toggle_pin(2)
//!     .build()
//!     .unwrap_err();
//! match err {
//!     ConfigError::Invalid { violations } => assert_eq!(violations.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```

mod builder;
mod error;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Slowest clock: 125 MHz system clock over the largest integer divider.
pub const MIN_FREQUENCY_HZ: u32 = 1_908;
/// Fastest clock: the system clock itself.
pub const MAX_FREQUENCY_HZ: u32 = 125_000_000;
/// GPIO0 through GPIO29.
pub const GPIO_COUNT: u8 = 30;
/// Width of the counter display.
pub const OUTPUT_COUNT: u8 = 4;

/// Static configuration of one counter machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// State machine clock in Hz.
    pub frequency_hz: u32,
    /// GPIO of the toggle button (pulled down, high when pressed).
    pub toggle_pin: u8,
    /// GPIO of output bit 0; bits 1..=3 follow on consecutive pins.
    pub out_base: u8,
    /// Number of transitions kept in the history.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 2_000,
            toggle_pin: 15,
            out_base: 0,
            history_capacity: 64,
        }
    }
}

impl MachineConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse a JSON configuration and validate it. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MachineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.checked()
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = Vec::new();

        checks.push(
            if (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&self.frequency_hz) {
                Validation::success(())
            } else {
                Validation::fail(ConfigViolation::FrequencyOutOfRange {
                    hz: self.frequency_hz,
                    min: MIN_FREQUENCY_HZ,
                    max: MAX_FREQUENCY_HZ,
                })
            },
        );

        checks.push(if self.toggle_pin < GPIO_COUNT {
            Validation::success(())
        } else {
            Validation::fail(ConfigViolation::TogglePinOutOfRange {
                pin: self.toggle_pin,
            })
        });

        checks.push(
            if u16::from(self.out_base) + u16::from(OUTPUT_COUNT) <= u16::from(GPIO_COUNT) {
                Validation::success(())
            } else {
                Validation::fail(ConfigViolation::OutputsOutOfRange {
                    base: self.out_base,
                })
            },
        );

        checks.push(if self.output_pins().contains(&self.toggle_pin) {
            Validation::fail(ConfigViolation::TogglePinOverlapsOutputs {
                pin: self.toggle_pin,
                base: self.out_base,
            })
        } else {
            Validation::success(())
        });

        checks.push(if self.history_capacity > 0 {
            Validation::success(())
        } else {
            Validation::fail(ConfigViolation::ZeroHistoryCapacity)
        });

        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate, turning the accumulated violations into a `ConfigError`.
    pub fn checked(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(errors) => Err(ConfigError::Invalid {
                violations: errors.iter().cloned().collect(),
            }),
        }
    }

    /// GPIO numbers of output bits 0..=3.
    pub fn output_pins(&self) -> std::ops::Range<u8> {
        self.out_base..self.out_base.saturating_add(OUTPUT_COUNT)
    }

    /// Nanoseconds taken by `cycles` clock cycles.
    pub fn cycles_to_nanos(&self, cycles: u64) -> u64 {
        if self.frequency_hz == 0 {
            return 0;
        }
        let nanos = u128::from(cycles) * 1_000_000_000 / u128::from(self.frequency_hz);
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    pub fn cycles_to_duration(&self, cycles: u64) -> Duration {
        Duration::from_nanos(self.cycles_to_nanos(cycles))
    }
}
