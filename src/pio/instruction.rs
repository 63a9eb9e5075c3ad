//! Instruction model for the programmable I/O state machine.
//!
//! Only the instructions the counter program needs are modelled: `jmp`,
//! `wait`, `in`, `out`, `mov` and `set`. Every instruction may carry up to
//! 31 delay cycles that run after it completes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum JmpCondition {
    Always,
    /// `!x`: jump if x is zero.
    XIsZero,
    /// `x--`: jump if x is nonzero before the decrement.
    XDecrement,
    /// `!y`
    YIsZero,
    /// `y--`
    YDecrement,
    /// `x!=y`
    XNotEqualY,
    /// `pin`: jump if the jump pin is high.
    Pin,
    /// `!osre`: jump if the output shift register still holds bits.
    OsrNotEmpty,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum WaitSource {
    /// Absolute GPIO number.
    Gpio,
    /// Index relative to the input pin base.
    Pin,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InSource {
    Pins,
    X,
    Y,
    Null,
    Isr,
    Osr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OutDestination {
    Pins,
    X,
    Y,
    Null,
    Pc,
    Isr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MovDestination {
    Pins,
    X,
    Y,
    Pc,
    Isr,
    Osr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MovOp {
    None,
    Invert,
    BitReverse,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MovSource {
    Pins,
    X,
    Y,
    Null,
    Isr,
    Osr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SetDestination {
    X,
    Y,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Operation {
    Jmp {
        condition: JmpCondition,
        address: u8,
    },
    Wait {
        polarity: bool,
        source: WaitSource,
        index: u8,
    },
    In {
        source: InSource,
        bit_count: u8,
    },
    Out {
        destination: OutDestination,
        bit_count: u8,
    },
    Mov {
        destination: MovDestination,
        op: MovOp,
        source: MovSource,
    },
    Set {
        destination: SetDestination,
        data: u8,
    },
}

/// One assembled instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Instruction {
    pub operation: Operation,
    /// Extra idle cycles after the instruction completes.
    pub delay: u8,
}

impl fmt::Display for JmpCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Always => "",
            Self::XIsZero => "!x, ",
            Self::XDecrement => "x--, ",
            Self::YIsZero => "!y, ",
            Self::YDecrement => "y--, ",
            Self::XNotEqualY => "x!=y, ",
            Self::Pin => "pin, ",
            Self::OsrNotEmpty => "!osre, ",
        };
        f.write_str(text)
    }
}

fn register_name<T: fmt::Debug>(value: &T) -> String {
    format!("{value:?}").to_lowercase()
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Jmp { condition, address } => write!(f, "jmp {condition}{address}")?,
            Operation::Wait {
                polarity,
                source,
                index,
            } => write!(
                f,
                "wait {} {} {index}",
                u8::from(polarity),
                register_name(&source)
            )?,
            Operation::In { source, bit_count } => {
                write!(f, "in {}, {bit_count}", register_name(&source))?
            }
            Operation::Out {
                destination,
                bit_count,
            } => write!(f, "out {}, {bit_count}", register_name(&destination))?,
            Operation::Mov {
                destination,
                op,
                source,
            } => {
                let op = match op {
                    MovOp::None => "",
                    MovOp::Invert => "~",
                    MovOp::BitReverse => "::",
                };
                write!(
                    f,
                    "mov {}, {op}{}",
                    register_name(&destination),
                    register_name(&source)
                )?
            }
            Operation::Set { destination, data } => {
                write!(f, "set {}, {data}", register_name(&destination))?
            }
        }
        if self.delay > 0 {
            write!(f, " [{}]", self.delay)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_assembly() {
        let jmp = Instruction {
            operation: Operation::Jmp {
                condition: JmpCondition::Pin,
                address: 12,
            },
            delay: 31,
        };
        assert_eq!(jmp.to_string(), "jmp pin, 12 [31]");

        let mov = Instruction {
            operation: Operation::Mov {
                destination: MovDestination::Y,
                op: MovOp::Invert,
                source: MovSource::Y,
            },
            delay: 0,
        };
        assert_eq!(mov.to_string(), "mov y, ~y");

        let wait = Instruction {
            operation: Operation::Wait {
                polarity: false,
                source: WaitSource::Pin,
                index: 0,
            },
            delay: 0,
        };
        assert_eq!(wait.to_string(), "wait 0 pin 0");
    }

    #[test]
    fn unconditional_jump_has_no_condition_text() {
        let jmp = Instruction {
            operation: Operation::Jmp {
                condition: JmpCondition::Always,
                address: 2,
            },
            delay: 0,
        };
        assert_eq!(jmp.to_string(), "jmp 2");
    }
}
