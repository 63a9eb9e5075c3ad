//! Programs and a small label-resolving assembler.

use super::instruction::{
    InSource, Instruction, JmpCondition, MovDestination, MovOp, MovSource, Operation,
    OutDestination, SetDestination, WaitSource,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Instruction memory size.
pub const MAX_PROGRAM_LEN: usize = 32;
/// Largest delay an instruction can carry.
pub const MAX_DELAY: u8 = 31;
/// Largest immediate accepted by `set`.
pub const MAX_SET_DATA: u8 = 31;

/// Errors that can occur when assembling a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("Program is empty")]
    Empty,

    #[error("Program has {len} instructions, at most {} fit", MAX_PROGRAM_LEN)]
    TooLong { len: usize },

    #[error("Jump to unknown label '{0}'")]
    UnknownLabel(String),

    #[error("Label '{0}' defined twice")]
    DuplicateLabel(String),

    #[error("Instruction {index}: delay {delay} exceeds {}", MAX_DELAY)]
    DelayOutOfRange { index: usize, delay: u8 },

    #[error("Delay given before any instruction")]
    MisplacedDelay,

    #[error("Instruction {index}: set data {data} exceeds {}", MAX_SET_DATA)]
    SetDataOutOfRange { index: usize, data: u8 },

    #[error("Instruction {index}: bit count {count} must be within 1..=32")]
    BitCountOutOfRange { index: usize, count: u8 },
}

/// An assembled program with its labels and wrap points.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, u8>,
    wrap_target: u8,
    wrap: u8,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, address: u8) -> Option<&Instruction> {
        self.instructions.get(usize::from(address))
    }

    /// Address of a label.
    pub fn label(&self, name: &str) -> Option<u8> {
        self.labels.get(name).copied()
    }

    /// Address execution continues at after `wrap`.
    pub fn wrap_target(&self) -> u8 {
        self.wrap_target
    }

    /// Last instruction before execution wraps.
    pub fn wrap(&self) -> u8 {
        self.wrap
    }

    /// The counter/toggle program.
    ///
    /// x holds the counter, then the delay countdown while the counter is
    /// parked in the output shift register. y holds the direction: zero
    /// decrements, anything else increments. Incrementing is done as
    /// complement, decrement, complement since only `x--` exists.
    pub fn toggle_binary() -> Program {
        ProgramBuilder::new()
            .set(SetDestination::X, 0b1111)
            .set(SetDestination::Y, 0)
            .label("begin")
            .mov(MovDestination::Pins, MovOp::None, MovSource::X)
            .in_(InSource::X, 4)
            .mov(MovDestination::Osr, MovOp::None, MovSource::Isr)
            .in_(InSource::Null, 32)
            .set(SetDestination::X, 0b11111)
            .label("delay")
            .jmp(JmpCondition::Pin, "toggle_press")
            .delay(31)
            .jmp(JmpCondition::XDecrement, "delay")
            .delay(31)
            .out(OutDestination::X, 4)
            .jmp(JmpCondition::YIsZero, "decrement")
            .jmp(JmpCondition::Always, "increment")
            .label("toggle_press")
            .wait(false, WaitSource::Pin, 0)
            .mov(MovDestination::Y, MovOp::Invert, MovSource::Y)
            .out(OutDestination::X, 4)
            .jmp(JmpCondition::YIsZero, "decrement")
            .label("increment")
            .mov(MovDestination::X, MovOp::Invert, MovSource::X)
            .jmp(JmpCondition::XDecrement, "next")
            .label("next")
            .mov(MovDestination::X, MovOp::Invert, MovSource::X)
            .jmp(JmpCondition::Always, "begin")
            .label("decrement")
            .jmp(JmpCondition::XDecrement, "begin")
            .build()
            .expect("Toggle program should always assemble")
    }
}

#[derive(Clone, Debug)]
enum Pending {
    Ready(Operation),
    Jump { condition: JmpCondition, label: String },
}

/// Builder for assembling programs with a fluent API.
///
/// # Example
///
/// ```rust
/// use toggle_counter::pio::{JmpCondition, ProgramBuilder, SetDestination};
///
/// let program = ProgramBuilder::new()
///     .label("top")
///     .set(SetDestination::X, 3)
///     .jmp(JmpCondition::Always, "top")
///     .delay(7)
///     .build()
///     .unwrap();
///
/// assert_eq!(program.len(), 2);
/// assert_eq!(program.label("top"), Some(0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    pending: Vec<(Pending, u8)>,
    labels: BTreeMap<String, u8>,
    wrap_target: Option<u8>,
    wrap: Option<u8>,
    error: Option<AssemblyError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, pending: Pending) -> Self {
        self.pending.push((pending, 0));
        self
    }

    fn fail(mut self, error: AssemblyError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    fn here(&self) -> u8 {
        u8::try_from(self.pending.len()).unwrap_or(u8::MAX)
    }

    /// Name the address of the next instruction.
    pub fn label(mut self, name: &str) -> Self {
        let address = self.here();
        if self.labels.insert(name.to_string(), address).is_some() {
            return self.fail(AssemblyError::DuplicateLabel(name.to_string()));
        }
        self
    }

    /// Execution wraps back to the next instruction.
    pub fn wrap_target(mut self) -> Self {
        self.wrap_target = Some(self.here());
        self
    }

    /// Execution wraps after the previous instruction.
    pub fn wrap(mut self) -> Self {
        self.wrap = Some(self.here().saturating_sub(1));
        self
    }

    /// Delay cycles for the previous instruction.
    pub fn delay(mut self, cycles: u8) -> Self {
        if let Some((_, delay)) = self.pending.last_mut() {
            *delay = cycles;
            return self;
        }
        self.fail(AssemblyError::MisplacedDelay)
    }

    pub fn jmp(self, condition: JmpCondition, label: &str) -> Self {
        self.push(Pending::Jump {
            condition,
            label: label.to_string(),
        })
    }

    pub fn wait(self, polarity: bool, source: WaitSource, index: u8) -> Self {
        self.push(Pending::Ready(Operation::Wait {
            polarity,
            source,
            index,
        }))
    }

    pub fn in_(self, source: InSource, bit_count: u8) -> Self {
        self.push(Pending::Ready(Operation::In { source, bit_count }))
    }

    pub fn out(self, destination: OutDestination, bit_count: u8) -> Self {
        self.push(Pending::Ready(Operation::Out {
            destination,
            bit_count,
        }))
    }

    pub fn mov(self, destination: MovDestination, op: MovOp, source: MovSource) -> Self {
        self.push(Pending::Ready(Operation::Mov {
            destination,
            op,
            source,
        }))
    }

    pub fn set(self, destination: SetDestination, data: u8) -> Self {
        self.push(Pending::Ready(Operation::Set { destination, data }))
    }

    /// Resolve labels and validate every instruction.
    pub fn build(self) -> Result<Program, AssemblyError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.pending.is_empty() {
            return Err(AssemblyError::Empty);
        }
        if self.pending.len() > MAX_PROGRAM_LEN {
            return Err(AssemblyError::TooLong {
                len: self.pending.len(),
            });
        }

        let mut instructions = Vec::with_capacity(self.pending.len());
        for (index, (pending, delay)) in self.pending.into_iter().enumerate() {
            if delay > MAX_DELAY {
                return Err(AssemblyError::DelayOutOfRange { index, delay });
            }
            let operation = match pending {
                Pending::Ready(operation) => operation,
                Pending::Jump { condition, label } => {
                    let address = *self
                        .labels
                        .get(&label)
                        .ok_or(AssemblyError::UnknownLabel(label))?;
                    Operation::Jmp { condition, address }
                }
            };
            validate(index, &operation)?;
            instructions.push(Instruction { operation, delay });
        }

        let last = u8::try_from(instructions.len() - 1).unwrap_or(u8::MAX);
        Ok(Program {
            instructions,
            labels: self.labels,
            wrap_target: self.wrap_target.unwrap_or(0).min(last),
            wrap: self.wrap.unwrap_or(last).min(last),
        })
    }
}

fn validate(index: usize, operation: &Operation) -> Result<(), AssemblyError> {
    match *operation {
        Operation::Set { data, .. } if data > MAX_SET_DATA => {
            Err(AssemblyError::SetDataOutOfRange { index, data })
        }
        Operation::In { bit_count, .. } | Operation::Out { bit_count, .. }
            if bit_count == 0 || bit_count > 32 =>
        {
            Err(AssemblyError::BitCountOutOfRange {
                index,
                count: bit_count,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_program_layout() {
        let program = Program::toggle_binary();
        assert_eq!(program.len(), 21);
        assert_eq!(program.label("begin"), Some(2));
        assert_eq!(program.label("delay"), Some(7));
        assert_eq!(program.label("toggle_press"), Some(12));
        assert_eq!(program.label("increment"), Some(16));
        assert_eq!(program.label("next"), Some(18));
        assert_eq!(program.label("decrement"), Some(20));
        assert_eq!(program.wrap_target(), 0);
        assert_eq!(program.wrap(), 20);
    }

    #[test]
    fn toggle_program_delay_ticks_are_balanced() {
        let program = Program::toggle_binary();
        let check = program.get(7).unwrap();
        let count = program.get(8).unwrap();
        assert_eq!(check.delay, 31);
        assert_eq!(count.delay, 31);
        assert_eq!(check.to_string(), "jmp pin, 12 [31]");
        assert_eq!(count.to_string(), "jmp x--, 7 [31]");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let result = ProgramBuilder::new()
            .jmp(JmpCondition::Always, "nowhere")
            .build();
        assert_eq!(
            result.unwrap_err(),
            AssemblyError::UnknownLabel("nowhere".to_string())
        );
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let result = ProgramBuilder::new()
            .label("a")
            .set(SetDestination::X, 1)
            .label("a")
            .set(SetDestination::X, 2)
            .build();
        assert_eq!(
            result.unwrap_err(),
            AssemblyError::DuplicateLabel("a".to_string())
        );
    }

    #[test]
    fn empty_program_is_rejected() {
        assert_eq!(ProgramBuilder::new().build().unwrap_err(), AssemblyError::Empty);
    }

    #[test]
    fn delay_before_instruction_is_rejected() {
        let result = ProgramBuilder::new()
            .delay(3)
            .set(SetDestination::X, 1)
            .build();
        assert_eq!(result.unwrap_err(), AssemblyError::MisplacedDelay);
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let delay = ProgramBuilder::new()
            .set(SetDestination::X, 1)
            .delay(32)
            .build();
        assert!(matches!(
            delay,
            Err(AssemblyError::DelayOutOfRange { index: 0, delay: 32 })
        ));

        let data = ProgramBuilder::new().set(SetDestination::Y, 32).build();
        assert!(matches!(
            data,
            Err(AssemblyError::SetDataOutOfRange { index: 0, data: 32 })
        ));

        let bits = ProgramBuilder::new().in_(InSource::X, 0).build();
        assert!(matches!(
            bits,
            Err(AssemblyError::BitCountOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn long_program_is_rejected() {
        let mut builder = ProgramBuilder::new();
        for _ in 0..33 {
            builder = builder.set(SetDestination::X, 0);
        }
        assert_eq!(
            builder.build().unwrap_err(),
            AssemblyError::TooLong { len: 33 }
        );
    }

    #[test]
    fn explicit_wrap_points() {
        let program = ProgramBuilder::new()
            .set(SetDestination::X, 0)
            .wrap_target()
            .set(SetDestination::Y, 0)
            .wrap()
            .set(SetDestination::X, 1)
            .build()
            .unwrap();
        assert_eq!(program.wrap_target(), 1);
        assert_eq!(program.wrap(), 1);
    }
}
