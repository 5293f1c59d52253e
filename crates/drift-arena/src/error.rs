//! Arena-specific error types.

use thiserror::Error;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The request does not fit in the remaining capacity.
    ///
    /// Arenas are sized for the worst-case frame, so callers normally
    /// treat this as fatal.
    #[error(
        "arena '{label}' out of memory: requested {requested} bytes with {used} of {capacity} bytes in use"
    )]
    OutOfMemory {
        /// Label of the exhausted arena.
        label: &'static str,
        /// Number of bytes requested (before alignment padding).
        requested: usize,
        /// Bytes in use when the request was made.
        used: usize,
        /// Total capacity of the arena in bytes.
        capacity: usize,
    },
    /// Alignment is zero, not a power of two, or above the arena maximum.
    #[error("alignment {align} is not a power of two in 1..={max}")]
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
        /// Largest supported alignment.
        max: usize,
    },
    /// The allocation's range was reclaimed by `reset` or `reset_to`.
    #[error("stale allocation at offset {offset} ({len} bytes): its range has been reset")]
    StaleAllocation {
        /// Start of the allocation in bytes.
        offset: usize,
        /// Length of the allocation in bytes.
        len: usize,
    },
    /// The allocation or mark was issued by another arena.
    #[error("allocation was issued by a different arena")]
    ForeignAllocation,
    /// The mark was issued before a reset or has already been rewound past.
    #[error("mark at offset {offset} is no longer valid")]
    InvalidMark {
        /// Offset recorded in the mark.
        offset: usize,
    },
    /// The allocation's bytes cannot be viewed as the requested type.
    #[error("cannot view {len} bytes at offset {offset} as `{type_name}`")]
    BadCast {
        /// Start of the allocation in bytes.
        offset: usize,
        /// Length of the allocation in bytes.
        len: usize,
        /// Name of the target type.
        type_name: &'static str,
    },
    /// Arena configuration failed validation.
    #[error("invalid arena config: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}
