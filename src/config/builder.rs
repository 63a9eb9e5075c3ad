//! Builder for machine configurations.

use super::{ConfigError, MachineConfig};

/// Builder for [`MachineConfig`] with a fluent API.
///
/// Unset fields keep their defaults (2000 Hz, toggle on GPIO15, outputs
/// on GPIO0..=3). `build` validates the result.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: MachineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// State machine clock in Hz.
    pub fn frequency(mut self, hz: u32) -> Self {
        self.config.frequency_hz = hz;
        self
    }

    pub fn toggle_pin(mut self, pin: u8) -> Self {
        self.config.toggle_pin = pin;
        self
    }

    /// First of the four consecutive output pins.
    pub fn out_base(mut self, pin: u8) -> Self {
        self.config.out_base = pin;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Build the configuration.
    /// Returns every violated rule if validation fails.
    pub fn build(self) -> Result<MachineConfig, ConfigError> {
        self.config.checked()
    }
}
