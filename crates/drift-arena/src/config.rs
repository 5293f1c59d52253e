//! Arena configuration parameters.

use crate::arena::Arena;
use crate::error::ArenaError;

/// Configuration for a single [`Arena`].
///
/// Validated at construction; the arena never grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Name used in log lines and error messages.
    pub label: &'static str,

    /// Capacity in bytes.
    ///
    /// Default: 1 MiB. Must be non-zero and at most
    /// [`Arena::MAX_CAPACITY`].
    pub capacity: usize,
}

impl ArenaConfig {
    /// Default capacity: 1 MiB.
    pub const DEFAULT_CAPACITY: usize = 1 << 20;

    /// Create a config with the given label and capacity.
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self { label, capacity }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!("arena '{}' has zero capacity", self.label),
            });
        }
        if self.capacity > Arena::MAX_CAPACITY {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "arena '{}' capacity {} exceeds maximum {}",
                    self.label,
                    self.capacity,
                    Arena::MAX_CAPACITY
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new("arena", Self::DEFAULT_CAPACITY)
    }
}
