//! Checkpoint and resume for simulated counter machines.
//!
//! A checkpoint captures the configuration, the logical core (state,
//! registers, cycle) and the retained history. JSON is readable, the
//! bincode form is compact. Loading always validates.

use crate::config::MachineConfig;
use crate::core::{CounterCore, CounterState, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a counter machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub config: MachineConfig,

    /// State, registers and cycle of the machine
    pub core: CounterCore,

    /// Retained transition history
    pub history: StateHistory<CounterState>,
}

impl Checkpoint {
    pub fn new(
        config: MachineConfig,
        core: CounterCore,
        history: StateHistory<CounterState>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            config,
            core,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Checkpoint = serde_json::from_str(json)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Checkpoint = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Check version, configuration and history consistency.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        self.config.clone().checked()?;

        if self.history.len() > self.history.capacity() {
            return Err(CheckpointError::InconsistentHistory(format!(
                "history holds {} transitions but capacity is {}",
                self.history.len(),
                self.history.capacity()
            )));
        }

        if let Some(last) = self.history.last() {
            if last.to != self.core.state() || last.end_cycle() != self.core.cycle() {
                return Err(CheckpointError::InconsistentHistory(format!(
                    "history ends in {:?} at cycle {} but machine is in {:?} at cycle {}",
                    last.to,
                    last.end_cycle(),
                    self.core.state(),
                    self.core.cycle()
                )));
            }
        }

        Ok(())
    }
}
