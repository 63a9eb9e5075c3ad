//! Deterministic button input and recorded display output.
//!
//! A [`ButtonScript`] says when the toggle pin is held high, in machine
//! cycles. Both the cycle-accurate simulator and the effect runner read
//! the same script, which is what makes their outputs comparable.

use crate::core::{Nibble, PinLevel};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One write to the output pins.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Frame {
    /// Machine cycle of the write.
    pub cycle: u64,
    pub value: Nibble,
}

/// Press intervals for the toggle pin, in machine cycles.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::PinLevel;
/// use toggle_counter::stimulus::ButtonScript;
///
/// let script = ButtonScript::new().press(100, 50);
/// assert_eq!(script.level_at(99), PinLevel::Low);
/// assert_eq!(script.level_at(100), PinLevel::High);
/// assert_eq!(script.level_at(149), PinLevel::High);
/// assert_eq!(script.level_at(150), PinLevel::Low);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonScript {
    presses: Vec<Range<u64>>,
}

impl ButtonScript {
    /// A script where the button is never pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the button from cycle `at` for `hold` cycles.
    pub fn press(mut self, at: u64, hold: u64) -> Self {
        self.presses.push(at..at.saturating_add(hold));
        self
    }

    /// Hold the button from cycle `at` forever.
    pub fn stuck_from(mut self, at: u64) -> Self {
        self.presses.push(at..u64::MAX);
        self
    }

    pub fn level_at(&self, cycle: u64) -> PinLevel {
        PinLevel::from(self.presses.iter().any(|press| press.contains(&cycle)))
    }

    pub fn presses(&self) -> &[Range<u64>] {
        &self.presses
    }
}

/// Values of a frame sequence, dropping the cycle stamps.
pub fn values(frames: &[Frame]) -> Vec<u8> {
    frames.iter().map(|frame| frame.value.value()).collect()
}
