//! Cycle-accurate executor for programs.
//!
//! One call to [`PioStateMachine::tick`] is one clock cycle. An instruction
//! executes in a single cycle and is then followed by its delay cycles. A
//! `wait` whose condition does not hold stalls: it re-executes every cycle
//! and its delay only starts once it completes.

use super::instruction::{
    InSource, Instruction, JmpCondition, MovDestination, MovOp, MovSource, Operation,
    OutDestination, SetDestination, WaitSource,
};
use super::program::Program;
use crate::config::{MachineConfig, OUTPUT_COUNT};
use crate::core::{CounterState, Nibble, PinLevel};
use crate::stimulus::{ButtonScript, Frame};
use log::trace;
use serde::{Deserialize, Serialize};

/// GPIO mapping of a state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PinMapping {
    /// First pin written by `out pins` / `mov pins`.
    pub out_base: u8,
    pub out_count: u8,
    /// Pin read as bit 0 by `in pins` / `wait pin`.
    pub in_base: u8,
    /// Pin tested by `jmp pin`.
    pub jmp_pin: u8,
}

impl PinMapping {
    /// Outputs on the configured base, toggle pin as both input base and
    /// jump pin.
    pub fn from_config(config: &MachineConfig) -> Self {
        Self {
            out_base: config.out_base,
            out_count: OUTPUT_COUNT,
            in_base: config.toggle_pin,
            jmp_pin: config.toggle_pin,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Shift directions of the input and output shift registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub in_shift: ShiftDirection,
    pub out_shift: ShiftDirection,
}

impl Default for ShiftConfig {
    /// Input shifts left, output shifts right (least significant bits
    /// leave the output shift register first).
    fn default() -> Self {
        Self {
            in_shift: ShiftDirection::Left,
            out_shift: ShiftDirection::Right,
        }
    }
}

enum Outcome {
    Stall,
    Done { jump: Option<u8>, wrote_pins: bool },
}

fn mask(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Register-level model of one programmable I/O state machine.
#[derive(Clone, Debug)]
pub struct PioStateMachine {
    program: Program,
    pins: PinMapping,
    shift: ShiftConfig,
    x: u32,
    y: u32,
    isr: u32,
    isr_count: u8,
    osr: u32,
    osr_count: u8,
    pc: u8,
    delay: u8,
    stalled: bool,
    gpio_in: u32,
    gpio_out: u32,
    cycle: u64,
}

impl PioStateMachine {
    /// A machine at the start of `program` with all registers cleared.
    pub fn new(program: Program, pins: PinMapping, shift: ShiftConfig) -> Self {
        Self {
            program,
            pins,
            shift,
            x: 0,
            y: 0,
            isr: 0,
            isr_count: 0,
            osr: 0,
            osr_count: 32,
            pc: 0,
            delay: 0,
            stalled: false,
            gpio_in: 0,
            gpio_out: 0,
            cycle: 0,
        }
    }

    /// The counter/toggle program wired as `config` describes.
    pub fn toggle_binary(config: &MachineConfig) -> Self {
        Self::new(
            Program::toggle_binary(),
            PinMapping::from_config(config),
            ShiftConfig::default(),
        )
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    /// Address of the instruction that executes next.
    pub fn pc(&self) -> u8 {
        self.pc
    }

    /// Cycle that the next `tick` simulates.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether the last executed instruction was a `wait` that stalled.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Drive an input GPIO.
    pub fn set_input(&mut self, pin: u8, level: PinLevel) {
        let bit = 1u32 << (pin % 32);
        if level.is_asserted() {
            self.gpio_in |= bit;
        } else {
            self.gpio_in &= !bit;
        }
    }

    /// Levels of all 32 output GPIOs.
    pub fn output_pins(&self) -> u32 {
        self.gpio_out
    }

    /// The four output pins as a counter value.
    pub fn display(&self) -> Nibble {
        Nibble::from_low_bits(self.gpio_out.rotate_right(u32::from(self.pins.out_base)))
    }

    /// Logical counter state for the current program counter.
    ///
    /// Only meaningful for [`Program::toggle_binary`]; returns `None` for
    /// programs without its labels.
    pub fn counter_state(&self) -> Option<CounterState> {
        let label = |name| self.program.label(name);
        let delay = label("delay")?;
        let toggle = label("toggle_press")?;
        let increment = label("increment")?;
        let decrement = label("decrement")?;
        let pc = self.pc;

        // the preamble falls straight through into `begin`
        let state = if pc < delay {
            CounterState::Begin
        } else if pc < delay + 2 {
            CounterState::Delay
        } else if pc < toggle {
            CounterState::ApplyDelayExpired
        } else if pc < increment {
            CounterState::TogglePress
        } else if pc < decrement {
            CounterState::Increment
        } else {
            CounterState::Decrement
        };
        Some(state)
    }

    /// Simulate one clock cycle.
    ///
    /// Returns a frame when this cycle wrote the output pins.
    pub fn tick(&mut self) -> Option<Frame> {
        let cycle = self.cycle;
        self.cycle += 1;

        if self.delay > 0 {
            self.delay -= 1;
            return None;
        }

        let Some(instruction) = self.program.get(self.pc).copied() else {
            // Out-of-range pc cannot come from an assembled program; restart.
            self.pc = self.program.wrap_target();
            return None;
        };
        trace!("cycle {cycle}: {:02} {instruction}", self.pc);

        match self.execute(&instruction) {
            Outcome::Stall => {
                self.stalled = true;
                None
            }
            Outcome::Done { jump, wrote_pins } => {
                self.stalled = false;
                self.pc = jump.unwrap_or_else(|| self.next_pc());
                self.delay = instruction.delay;
                wrote_pins.then(|| Frame {
                    cycle,
                    value: self.display(),
                })
            }
        }
    }

    /// Run until `until` (exclusive), driving the input pin from `script`
    /// before every cycle. Returns every display write.
    pub fn run_script(&mut self, script: &ButtonScript, until: u64) -> Vec<Frame> {
        let mut frames = Vec::new();
        while self.cycle < until {
            self.set_input(self.pins.in_base, script.level_at(self.cycle));
            if let Some(frame) = self.tick() {
                frames.push(frame);
            }
        }
        frames
    }

    fn next_pc(&self) -> u8 {
        if self.pc == self.program.wrap() {
            self.program.wrap_target()
        } else {
            self.pc + 1
        }
    }

    fn pin_level(&self, pin: u8) -> bool {
        (self.gpio_in >> (pin % 32)) & 1 == 1
    }

    fn read_pins(&self) -> u32 {
        self.gpio_in.rotate_right(u32::from(self.pins.in_base))
    }

    fn write_pins(&mut self, value: u32) {
        for bit in 0..self.pins.out_count {
            let pin = u32::from(self.pins.out_base.wrapping_add(bit) % 32);
            if (value >> bit) & 1 == 1 {
                self.gpio_out |= 1 << pin;
            } else {
                self.gpio_out &= !(1 << pin);
            }
        }
    }

    fn shift_in(&mut self, data: u32, bits: u8) {
        let data = data & mask(bits);
        self.isr = match (self.shift.in_shift, bits) {
            (_, 32) => data,
            (ShiftDirection::Left, n) => (self.isr << n) | data,
            (ShiftDirection::Right, n) => (self.isr >> n) | (data << (32 - n)),
        };
        self.isr_count = self.isr_count.saturating_add(bits).min(32);
    }

    fn shift_out(&mut self, bits: u8) -> u32 {
        let data = match (self.shift.out_shift, bits) {
            (_, 32) => {
                let data = self.osr;
                self.osr = 0;
                data
            }
            (ShiftDirection::Right, n) => {
                let data = self.osr & mask(n);
                self.osr >>= n;
                data
            }
            (ShiftDirection::Left, n) => {
                let data = self.osr >> (32 - n);
                self.osr <<= n;
                data
            }
        };
        self.osr_count = self.osr_count.saturating_add(bits).min(32);
        data
    }

    fn execute(&mut self, instruction: &Instruction) -> Outcome {
        let mut wrote_pins = false;
        let mut jump = None;

        match instruction.operation {
            Operation::Jmp { condition, address } => {
                let taken = match condition {
                    JmpCondition::Always => true,
                    JmpCondition::XIsZero => self.x == 0,
                    JmpCondition::XDecrement => {
                        let taken = self.x != 0;
                        self.x = self.x.wrapping_sub(1);
                        taken
                    }
                    JmpCondition::YIsZero => self.y == 0,
                    JmpCondition::YDecrement => {
                        let taken = self.y != 0;
                        self.y = self.y.wrapping_sub(1);
                        taken
                    }
                    JmpCondition::XNotEqualY => self.x != self.y,
                    JmpCondition::Pin => self.pin_level(self.pins.jmp_pin),
                    JmpCondition::OsrNotEmpty => self.osr_count < 32,
                };
                if taken {
                    jump = Some(address);
                }
            }
            Operation::Wait {
                polarity,
                source,
                index,
            } => {
                let pin = match source {
                    WaitSource::Gpio => index,
                    WaitSource::Pin => self.pins.in_base.wrapping_add(index),
                };
                if self.pin_level(pin) != polarity {
                    return Outcome::Stall;
                }
            }
            Operation::In { source, bit_count } => {
                let data = match source {
                    InSource::Pins => self.read_pins(),
                    InSource::X => self.x,
                    InSource::Y => self.y,
                    InSource::Null => 0,
                    InSource::Isr => self.isr,
                    InSource::Osr => self.osr,
                };
                self.shift_in(data, bit_count);
            }
            Operation::Out {
                destination,
                bit_count,
            } => {
                let data = self.shift_out(bit_count);
                match destination {
                    OutDestination::Pins => {
                        self.write_pins(data);
                        wrote_pins = true;
                    }
                    OutDestination::X => self.x = data,
                    OutDestination::Y => self.y = data,
                    OutDestination::Null => {}
                    OutDestination::Pc => jump = Some((data & 0x1f) as u8),
                    OutDestination::Isr => {
                        self.isr = data;
                        self.isr_count = bit_count;
                    }
                }
            }
            Operation::Mov {
                destination,
                op,
                source,
            } => {
                let value = match source {
                    MovSource::Pins => self.read_pins(),
                    MovSource::X => self.x,
                    MovSource::Y => self.y,
                    MovSource::Null => 0,
                    MovSource::Isr => self.isr,
                    MovSource::Osr => self.osr,
                };
                let value = match op {
                    MovOp::None => value,
                    MovOp::Invert => !value,
                    MovOp::BitReverse => value.reverse_bits(),
                };
                match destination {
                    MovDestination::Pins => {
                        self.write_pins(value);
                        wrote_pins = true;
                    }
                    MovDestination::X => self.x = value,
                    MovDestination::Y => self.y = value,
                    MovDestination::Pc => jump = Some((value & 0x1f) as u8),
                    MovDestination::Isr => {
                        self.isr = value;
                        self.isr_count = 0;
                    }
                    MovDestination::Osr => {
                        self.osr = value;
                        self.osr_count = 0;
                    }
                }
            }
            Operation::Set { destination, data } => match destination {
                SetDestination::X => self.x = u32::from(data),
                SetDestination::Y => self.y = u32::from(data),
            },
        }

        Outcome::Done { jump, wrote_pins }
    }
}
