//! Slot-store error types.

use drift_arena::ArenaError;
use drift_core::{Handle, Locator};
use thiserror::Error;

/// Why a locator was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LocatorFault {
    /// The page index is not below the store's page count.
    #[error("page out of range (store has {pages} pages)")]
    PageOutOfRange {
        /// Pages currently in the store.
        pages: u32,
    },
    /// The slot index is not below `PAGE_SIZE`.
    #[error("slot out of range")]
    SlotOutOfRange,
    /// The slot exists but holds no live element (e.g. a double remove).
    #[error("slot is not live")]
    NotLive,
}

/// Errors that can occur during slot-store operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotError {
    /// Malformed, out-of-range or dead locator.
    #[error("invalid locator {locator}: {reason}")]
    InvalidLocator {
        /// The rejected locator.
        locator: Locator,
        /// What was wrong with it.
        reason: LocatorFault,
    },
    /// The handle's slot was removed (and possibly reused) since issue.
    #[error("stale handle {handle}: slot generation is now {current}")]
    StaleHandle {
        /// The rejected handle.
        handle: Handle,
        /// The slot's current generation.
        current: u32,
    },
    /// Growing would exceed the page count that identifiers can encode.
    #[error("slot store cannot grow beyond {pages} pages")]
    PageLimit {
        /// The page limit.
        pages: u32,
    },
    /// The backing arena failed (exhausted, or reset under the store).
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
