//! Counter machine that performs board I/O through effects.

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::config::{ConfigError, MachineConfig};
use crate::core::{
    Advance, CounterCore, CounterState, Direction, Nibble, PinLevel, StateHistory,
    TransitionError,
};
use crate::effects::board::{Board, BoardError};
use log::{debug, info, trace};
use std::marker::PhantomData;
use stillwater::effect::Effect;
use stillwater::prelude::*;
use thiserror::Error;

/// Where the machine is in its start/stop lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lifecycle {
    Configured,
    Running,
    Stopped,
}

/// Errors raised while driving a [`CounterStateMachine`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    #[error("Machine is already running")]
    AlreadyStarted,

    #[error("Machine was stopped and cannot be restarted")]
    Stopped,

    #[error("Machine is not running")]
    NotRunning,

    /// A step result was applied to a machine that has moved on.
    #[error("Step from cycle {found} applied to machine at cycle {expected}")]
    StaleStep { expected: u64, found: u64 },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// The counter with its lifecycle, history and board I/O.
///
/// `step()` reads the toggle pin and writes the display through the
/// environment, returning the pure [`Advance`]; `apply_result()` then
/// commits it. `run_steps` and `run_until` do both in a loop.
pub struct CounterStateMachine<Env: Board> {
    config: MachineConfig,
    core: CounterCore,
    history: StateHistory<CounterState>,
    lifecycle: Lifecycle,
    _env: PhantomData<Env>,
}

impl<Env: Board> CounterStateMachine<Env> {
    /// Validate `config` and build a machine at `Begin`, not yet running.
    pub fn configure(config: MachineConfig) -> Result<Self, ConfigError> {
        let config = config.checked()?;
        debug!(
            "Configured counter: {} Hz, toggle pin {}, outputs {:?}",
            config.frequency_hz,
            config.toggle_pin,
            config.output_pins()
        );
        Ok(Self {
            history: StateHistory::with_capacity(config.history_capacity),
            config,
            core: CounterCore::new(),
            lifecycle: Lifecycle::Configured,
            _env: PhantomData,
        })
    }

    /// Resume from a checkpoint. The machine must be started again.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, CheckpointError> {
        checkpoint.validate()?;
        info!(
            "Resuming checkpoint {} at cycle {}",
            checkpoint.id,
            checkpoint.core.cycle()
        );
        Ok(Self {
            config: checkpoint.config,
            core: checkpoint.core,
            history: checkpoint.history,
            lifecycle: Lifecycle::Configured,
            _env: PhantomData,
        })
    }

    pub fn start(&mut self) -> Result<(), MachineError> {
        match self.lifecycle {
            Lifecycle::Configured => {
                info!(
                    "Starting counter at {} ({}), cycle {}",
                    self.core.counter(),
                    self.core.counter().value(),
                    self.core.cycle()
                );
                self.lifecycle = Lifecycle::Running;
                Ok(())
            }
            Lifecycle::Running => Err(MachineError::AlreadyStarted),
            Lifecycle::Stopped => Err(MachineError::Stopped),
        }
    }

    /// Stop immediately. Counter and direction keep their values.
    pub fn stop(&mut self) {
        if self.lifecycle != Lifecycle::Stopped {
            info!(
                "Stopping counter at {} in {:?}, cycle {}",
                self.core.counter(),
                self.core.state(),
                self.core.cycle()
            );
        }
        self.lifecycle = Lifecycle::Stopped;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn current_state(&self) -> CounterState {
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

    pub fn history(&self) -> &StateHistory<CounterState> {
        &self.history
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.config.clone(), self.core, self.history.clone())
    }

    /// Execute one step of the machine.
    /// After running the effect, call apply_result() to commit it.
    pub fn step(&self) -> impl Effect<Output = Advance, Error = MachineError, Env = Env> {
        if !self.is_running() {
            return fail(MachineError::NotRunning).boxed();
        }

        let core = self.core;
        from_fn(move |env: &Env| -> Result<Advance, MachineError> {
            let toggle = if core.state().samples_toggle() {
                env.toggle_level(core.cycle())?
            } else {
                PinLevel::Low
            };
            let advance = core.advance(toggle)?;
            if let Some(value) = advance.display {
                env.show(core.cycle(), value)?;
            }
            Ok(advance)
        })
        .boxed()
    }

    /// Apply the result from step() to update machine state.
    pub fn apply_result(&mut self, advance: Advance) -> Result<(), MachineError> {
        let transition = &advance.transition;
        if transition.cycle != self.core.cycle() || transition.from != self.core.state() {
            return Err(MachineError::StaleStep {
                expected: self.core.cycle(),
                found: transition.cycle,
            });
        }

        trace!(
            "cycle {}: {:?} -> {:?} ({} cycles)",
            transition.cycle,
            transition.from,
            transition.to,
            transition.cycles
        );
        if let Some(value) = advance.display {
            debug!("cycle {}: display {} ({})", transition.cycle, value, value.value());
        }
        if advance.flipped {
            debug!(
                "cycle {}: direction now {:?}",
                transition.cycle,
                advance.next.direction()
            );
        }

        self.history = self.history.record(advance.transition);
        self.core = advance.next;
        Ok(())
    }

    /// Run `steps` steps against `env`.
    pub async fn run_steps(&mut self, env: &Env, steps: usize) -> Result<(), MachineError> {
        for _ in 0..steps {
            let advance = self.step().run(env).await?;
            self.apply_result(advance)?;
        }
        Ok(())
    }

    /// Step until the next step would start at or after `cycle`.
    pub async fn run_until(&mut self, env: &Env, cycle: u64) -> Result<(), MachineError> {
        while self.core.cycle() < cycle {
            let advance = self.step().run(env).await?;
            self.apply_result(advance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::board::SimulatedBoard;
    use crate::stimulus::{values, ButtonScript};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn running(config: MachineConfig) -> CounterStateMachine<SimulatedBoard> {
        let mut machine = CounterStateMachine::configure(config).unwrap();
        machine.start().unwrap();
        machine
    }

    #[derive(Clone)]
    struct BrokenDisplay;

    impl Board for BrokenDisplay {
        fn toggle_level(&self, _cycle: u64) -> Result<PinLevel, BoardError> {
            Ok(PinLevel::Low)
        }

        fn show(&self, cycle: u64, _value: Nibble) -> Result<(), BoardError> {
            Err(BoardError::Write {
                cycle,
                reason: "bus fault".to_string(),
            })
        }
    }

    #[test]
    fn configure_rejects_invalid_config() {
        let config = MachineConfig {
            toggle_pin: 1,
            ..MachineConfig::default()
        };
        assert!(CounterStateMachine::<SimulatedBoard>::configure(config).is_err());
    }

    #[tokio::test]
    async fn step_before_start_fails() {
        let machine = CounterStateMachine::configure(MachineConfig::default()).unwrap();
        let board = SimulatedBoard::default();
        let result = machine.step().run(&board).await;
        assert_eq!(result.unwrap_err(), MachineError::NotRunning);
        assert!(board.frames().is_empty());
    }

    #[test]
    fn lifecycle_rejects_restart() {
        let mut machine =
            CounterStateMachine::<SimulatedBoard>::configure(MachineConfig::default()).unwrap();
        assert_eq!(machine.lifecycle(), Lifecycle::Configured);
        machine.start().unwrap();
        assert_eq!(machine.start(), Err(MachineError::AlreadyStarted));
        machine.stop();
        assert_eq!(machine.start(), Err(MachineError::Stopped));
        assert!(!machine.is_running());
    }

    #[tokio::test]
    async fn stop_keeps_counter_and_rejects_steps() {
        init_logger();
        let mut machine = running(MachineConfig::default());
        let board = SimulatedBoard::default();
        machine.run_until(&board, 2_100).await.unwrap();
        let counter = machine.counter();

        machine.stop();
        assert_eq!(
            machine.run_steps(&board, 1).await,
            Err(MachineError::NotRunning)
        );
        assert_eq!(machine.counter(), counter);
    }

    #[tokio::test]
    async fn counts_down_from_fifteen() {
        init_logger();
        let mut machine = running(MachineConfig::default());
        let board = SimulatedBoard::default();

        machine.run_until(&board, 6_200).await.unwrap();

        let frames = board.frames();
        assert_eq!(values(&frames), vec![15, 14, 13, 12]);
        let cycles: Vec<u64> = frames.iter().map(|f| f.cycle).collect();
        assert_eq!(cycles, vec![2, 2_058, 4_114, 6_170]);
        assert_eq!(machine.direction(), Direction::Decrement);
    }

    #[tokio::test]
    async fn press_in_fourth_delay_phase_reverses() {
        init_logger();
        let mut machine = running(MachineConfig::default());
        let board = SimulatedBoard::new(ButtonScript::new().press(6_500, 100));

        machine.run_until(&board, 16_000).await.unwrap();

        assert_eq!(
            values(&board.frames()),
            vec![15, 14, 13, 12, 13, 14, 15, 0, 1]
        );
        assert_eq!(machine.direction(), Direction::Increment);
    }

    #[tokio::test]
    async fn stuck_button_parks_in_toggle_press() {
        let mut machine = running(MachineConfig::default());
        let board = SimulatedBoard::new(ButtonScript::new().stuck_from(0));

        machine.run_steps(&board, 200).await.unwrap();

        assert_eq!(machine.current_state(), CounterState::TogglePress);
        assert_eq!(machine.direction(), Direction::Decrement);
        assert_eq!(values(&board.frames()), vec![15]);
    }

    #[tokio::test]
    async fn stale_result_is_rejected() {
        let mut machine = running(MachineConfig::default());
        let board = SimulatedBoard::default();

        let advance = machine.step().run(&board).await.unwrap();
        machine.apply_result(advance.clone()).unwrap();
        assert_eq!(
            machine.apply_result(advance),
            Err(MachineError::StaleStep {
                expected: 7,
                found: 2
            })
        );
    }

    #[tokio::test]
    async fn board_failure_surfaces_as_error() {
        let mut machine = CounterStateMachine::configure(MachineConfig::default()).unwrap();
        machine.start().unwrap();

        let err = machine.run_steps(&BrokenDisplay, 1).await.unwrap_err();
        assert!(matches!(err, MachineError::Board(BoardError::Write { cycle: 2, .. })));
        assert_eq!(machine.cycle(), 2);
    }

    #[tokio::test]
    async fn history_is_bounded_by_config() {
        let config = MachineConfig::builder().history_capacity(10).build().unwrap();
        let mut machine = running(config);
        let board = SimulatedBoard::default();

        machine.run_steps(&board, 50).await.unwrap();

        assert_eq!(machine.history().len(), 10);
        let last = machine.history().last().unwrap();
        assert_eq!(last.end_cycle(), machine.cycle());
    }

    #[tokio::test]
    async fn resumed_checkpoint_continues_the_same_frames() {
        let script = ButtonScript::new().press(3_000, 40);
        let mut original = running(MachineConfig::default());
        let reference = SimulatedBoard::new(script.clone());
        original.run_until(&reference, 3_500).await.unwrap();

        let json = original.checkpoint().to_json().unwrap();
        let mut resumed =
            CounterStateMachine::from_checkpoint(Checkpoint::from_json(&json).unwrap()).unwrap();
        resumed.start().unwrap();
        let board = SimulatedBoard::new(script);
        resumed.run_until(&board, 12_000).await.unwrap();
        original.run_until(&reference, 12_000).await.unwrap();

        let expected: Vec<_> = reference
            .frames()
            .into_iter()
            .filter(|frame| frame.cycle >= 3_500)
            .collect();
        assert_eq!(board.frames(), expected);
        assert_eq!(resumed.core(), original.core());
    }
}
