//! The environment an effectful counter runs against.

use crate::core::{Nibble, PinLevel};
use crate::stimulus::{ButtonScript, Frame};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by board I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Failed to read toggle pin at cycle {cycle}: {reason}")]
    Read { cycle: u64, reason: String },

    #[error("Failed to write outputs at cycle {cycle}: {reason}")]
    Write { cycle: u64, reason: String },
}

/// Pin access as seen by the effect runner.
///
/// Both calls carry the machine cycle at which they happen, so a board can
/// be driven by a script instead of wall-clock time.
pub trait Board: Clone + Send + Sync + 'static {
    fn toggle_level(&self, cycle: u64) -> Result<PinLevel, BoardError>;

    fn show(&self, cycle: u64, value: Nibble) -> Result<(), BoardError>;
}

/// Board backed by a [`ButtonScript`], recording every display write.
///
/// Clones share the recorded frames.
#[derive(Clone, Debug, Default)]
pub struct SimulatedBoard {
    script: Arc<ButtonScript>,
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl SimulatedBoard {
    pub fn new(script: ButtonScript) -> Self {
        Self {
            script: Arc::new(script),
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script(&self) -> &ButtonScript {
        &self.script
    }

    /// Frames shown so far, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        match self.frames.lock() {
            Ok(frames) => frames.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Last value shown, if any.
    pub fn display(&self) -> Option<Nibble> {
        self.frames().last().map(|frame| frame.value)
    }
}

impl Board for SimulatedBoard {
    fn toggle_level(&self, cycle: u64) -> Result<PinLevel, BoardError> {
        Ok(self.script.level_at(cycle))
    }

    fn show(&self, cycle: u64, value: Nibble) -> Result<(), BoardError> {
        let mut frames = self.frames.lock().map_err(|e| BoardError::Write {
            cycle,
            reason: e.to_string(),
        })?;
        frames.push(Frame { cycle, value });
        Ok(())
    }
}
