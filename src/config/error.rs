//! Configuration error types.

use thiserror::Error;

/// A single configuration rule that was broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigViolation {
    #[error("Frequency {hz} Hz outside {min}..={max} Hz")]
    FrequencyOutOfRange { hz: u32, min: u32, max: u32 },

    #[error("Toggle pin GPIO{pin} does not exist")]
    TogglePinOutOfRange { pin: u8 },

    #[error("Outputs starting at GPIO{base} run past the last GPIO")]
    OutputsOutOfRange { base: u8 },

    #[error("Toggle pin GPIO{pin} overlaps outputs starting at GPIO{base}")]
    TogglePinOverlapsOutputs { pin: u8, base: u8 },

    #[error("History capacity must be at least 1")]
    ZeroHistoryCapacity,
}

/// Errors that can occur when building or loading a configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Every violated rule, not just the first.
    #[error(
        "Invalid configuration: {}",
        .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Invalid { violations: Vec<ConfigViolation> },

    #[error("Configuration parse failed: {0}")]
    Parse(String),
}
