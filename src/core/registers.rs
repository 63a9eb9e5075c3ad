//! Register values owned by the counter state machine.
//!
//! Every type here is a small `Copy` value with wrapping arithmetic, so no
//! operation on them can fail or leave its documented range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 4-bit unsigned value, 0 through 15.
///
/// This is what the four output pins display. Arithmetic wraps modulo 16.
///
/// # Example
///
/// ```rust
/// use toggle_counter::core::Nibble;
///
/// let top = Nibble::MAX;
/// assert_eq!(top.increment(), Nibble::ZERO);
/// assert_eq!(Nibble::ZERO.decrement(), top);
/// assert_eq!(Nibble::new(16), None);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Nibble(u8);

impl Nibble {
    pub const ZERO: Nibble = Nibble(0);
    pub const MAX: Nibble = Nibble(0b1111);

    const MASK: u8 = 0b1111;

    /// Returns `None` when `value` does not fit in four bits.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MASK).then_some(Self(value))
    }

    /// Keep the low four bits of a wider register.
    pub fn from_low_bits(value: u32) -> Self {
        Self((value & u32::from(Self::MASK)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self(self.0.wrapping_add(1) & Self::MASK)
    }

    pub fn decrement(self) -> Self {
        Self(self.0.wrapping_sub(1) & Self::MASK)
    }

    /// Level of output bit `index` (0 is the least significant bit).
    pub fn bit(self, index: usize) -> bool {
        index < 4 && (self.0 >> index) & 1 == 1
    }
}

impl TryFrom<u8> for Nibble {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Nibble::new(value).ok_or_else(|| format!("{value} does not fit in 4 bits"))
    }
}

impl From<Nibble> for u8 {
    fn from(value: Nibble) -> Self {
        value.0
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

/// Counting direction.
///
/// The hardware encodes this as a whole register where zero means
/// decrement and any other value means increment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Decrement,
    Increment,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Self::Decrement => Self::Increment,
            Self::Increment => Self::Decrement,
        }
    }

    /// Move `value` one step in this direction.
    pub fn apply(self, value: Nibble) -> Nibble {
        match self {
            Self::Decrement => value.decrement(),
            Self::Increment => value.increment(),
        }
    }
}

/// The 5-bit countdown that paces one delay phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Countdown(u8);

impl Countdown {
    /// Value loaded at the start of every delay phase.
    pub const RELOAD: u8 = 0b11111;

    pub fn reload() -> Self {
        Self(Self::RELOAD)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_expired(self) -> bool {
        self.0 == 0
    }

    /// One delay tick. Saturates at zero; an expired countdown ends the
    /// phase instead of being ticked again.
    pub fn tick(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::reload()
    }
}

impl TryFrom<u8> for Countdown {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= Self::RELOAD {
            Ok(Self(value))
        } else {
            Err(format!("countdown {value} exceeds {}", Self::RELOAD))
        }
    }
}

impl From<Countdown> for u8 {
    fn from(value: Countdown) -> Self {
        value.0
    }
}

/// Logic level of the toggle input.
///
/// The input has a pull-down, so `High` means the button is pressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum PinLevel {
    #[default]
    Low,
    High,
}

impl PinLevel {
    pub fn is_asserted(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// The complete register file of the counter state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Registers {
    /// Value shown on the output pins.
    pub counter: Nibble,
    pub direction: Direction,
    /// Snapshot of `counter` taken when the delay phase starts.
    pub saved: Nibble,
    pub countdown: Countdown,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            counter: Nibble::MAX,
            direction: Direction::Decrement,
            saved: Nibble::MAX,
            countdown: Countdown::reload(),
        }
    }
}
