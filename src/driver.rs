//! Hardware driver over `embedded-hal` 1.0.
//!
//! [`ToggleCounter`] owns one input pin, four output pins and a delay
//! provider. Each [`poll`](ToggleCounter::poll) takes one step of the
//! pure core, samples the button when the state calls for it, writes the
//! display on `Begin` and then blocks for the step's cycle cost at the
//! configured clock. The pin is sampled at the start of a step, exactly
//! as the core and the simulator assume.

use crate::config::{ConfigError, MachineConfig, OUTPUT_COUNT};
use crate::core::{CounterCore, CounterState, Direction, Nibble, PinLevel, TransitionError};
use crate::effects::Lifecycle;
use std::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, InputPin, OutputPin, PinState};
use log::{debug, info, trace};
use thiserror::Error;

/// Errors raised by the hardware driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    #[error("Pin error: {0:?}")]
    Pin(ErrorKind),

    #[error("Counter is already running")]
    AlreadyStarted,

    #[error("Counter is not running")]
    NotRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

fn pin_error<E: embedded_hal::digital::Error>(error: E) -> DriverError {
    DriverError::Pin(error.kind())
}

/// The counter running on real pins.
pub struct ToggleCounter<I, O, D> {
    config: MachineConfig,
    toggle: I,
    outputs: [O; OUTPUT_COUNT as usize],
    delay: D,
    core: CounterCore,
    lifecycle: Lifecycle,
}

impl<I, O, D> ToggleCounter<I, O, D>
where
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the pins and drive every output low.
    ///
    /// `outputs[0]` carries bit 0. The pin numbers in `config` are only
    /// validated and logged; the pins themselves are already bound.
    pub fn configure(
        config: MachineConfig,
        toggle: I,
        mut outputs: [O; OUTPUT_COUNT as usize],
        delay: D,
    ) -> Result<Self, DriverError> {
        let config = config.checked()?;
        for pin in outputs.iter_mut() {
            pin.set_low().map_err(pin_error)?;
        }
        debug!(
            "Driver bound: toggle GPIO{}, outputs GPIO{:?}, {} Hz",
            config.toggle_pin,
            config.output_pins(),
            config.frequency_hz
        );
        Ok(Self {
            config,
            toggle,
            outputs,
            delay,
            core: CounterCore::new(),
            lifecycle: Lifecycle::Configured,
        })
    }

    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.lifecycle != Lifecycle::Configured {
            return Err(DriverError::AlreadyStarted);
        }
        // the preamble loads the registers before the first step
        self.wait(self.core.cycle());
        info!("Counter started at {}", self.core.counter());
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Run one step. Returns the value written to the outputs, if any.
    pub fn poll(&mut self) -> Result<Option<Nibble>, DriverError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(DriverError::NotRunning);
        }

        let toggle = if self.core.state().samples_toggle() {
            PinLevel::from(self.toggle.is_high().map_err(pin_error)?)
        } else {
            PinLevel::Low
        };
        let advance = self.core.advance(toggle)?;

        if let Some(value) = advance.display {
            self.show(value)?;
            debug!("cycle {}: display {}", self.core.cycle(), value);
        }
        if advance.flipped {
            debug!(
                "cycle {}: direction now {:?}",
                self.core.cycle(),
                advance.next.direction()
            );
        }
        trace!(
            "cycle {}: {:?} -> {:?}",
            self.core.cycle(),
            advance.transition.from,
            advance.transition.to
        );

        self.wait(u64::from(advance.transition.cycles));
        self.core = advance.next;
        Ok(advance.display)
    }

    /// Poll forever. Only returns on error.
    pub fn run(&mut self) -> Result<Infallible, DriverError> {
        loop {
            self.poll()?;
        }
    }

    /// Stop and hand the peripherals back. The outputs keep showing the
    /// last value.
    pub fn stop(self) -> (I, [O; OUTPUT_COUNT as usize], D) {
        info!(
            "Counter stopped at {} in {:?}, cycle {}",
            self.core.counter(),
            self.core.state(),
            self.core.cycle()
        );
        (self.toggle, self.outputs, self.delay)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> CounterState {
        self.core.state()
    }

    pub fn counter(&self) -> Nibble {
        self.core.counter()
    }

    pub fn direction(&self) -> Direction {
        self.core.direction()
    }

    pub fn cycle(&self) -> u64 {
        self.core.cycle()
    }

    pub fn core(&self) -> &CounterCore {
        &self.core
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    fn show(&mut self, value: Nibble) -> Result<(), DriverError> {
        for (index, pin) in self.outputs.iter_mut().enumerate() {
            pin.set_state(PinState::from(value.bit(index)))
                .map_err(pin_error)?;
        }
        Ok(())
    }

    fn wait(&mut self, cycles: u64) {
        let mut nanos = self.config.cycles_to_nanos(cycles);
        while nanos > 0 {
            let chunk = u32::try_from(nanos).unwrap_or(u32::MAX);
            self.delay.delay_ns(chunk);
            nanos -= u64::from(chunk);
        }
    }
}
