//! Frame memory configuration and validation.

use drift_arena::{ArenaConfig, ArenaError};
use thiserror::Error;

/// Errors detected during [`FrameConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One of the arena configs is invalid.
    #[error("arena: {0}")]
    Arena(#[from] ArenaError),
}

/// Sizes of the two arenas behind a [`FrameMemory`](crate::FrameMemory).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    /// Long-lived arena holding entity pages. Never reset by the frame loop.
    pub persistent: ArenaConfig,
    /// Per-frame arena holding render commands. Reset by every
    /// [`begin_frame`](crate::FrameMemory::begin_frame).
    pub scratch: ArenaConfig,
}

impl FrameConfig {
    /// Default persistent capacity: 4 MiB.
    pub const DEFAULT_PERSISTENT_CAPACITY: usize = 4 << 20;
    /// Default scratch capacity: 1 MiB.
    pub const DEFAULT_SCRATCH_CAPACITY: usize = 1 << 20;

    /// Config with explicit capacities and the standard labels.
    pub fn new(persistent_capacity: usize, scratch_capacity: usize) -> Self {
        Self {
            persistent: ArenaConfig::new("persistent", persistent_capacity),
            scratch: ArenaConfig::new("scratch", scratch_capacity),
        }
    }

    /// Check both arena configs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.persistent.validate()?;
        self.scratch.validate()?;
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_PERSISTENT_CAPACITY,
            Self::DEFAULT_SCRATCH_CAPACITY,
        )
    }
}
