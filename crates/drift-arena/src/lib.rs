//! Bump-pointer arenas for allocation-free frame loops.
//!
//! An [`Arena`] hands out byte ranges from one fixed buffer and takes them
//! back only in bulk. Two usage patterns are expected:
//!
//! ```text
//! persistent arena  (created at startup, reset on subsystem teardown)
//! └── slot-store pages, shared renderables
//! scratch arena     (reset once per frame)
//! └── render command nodes, per-frame temporaries
//!     └── mark() / reset_to()  scoped sub-allocations within a frame
//! ```
//!
//! Allocations are returned as [`Allocation`] / [`TypedAllocation`]
//! descriptors rather than pointers. Every access resolves the descriptor
//! through the arena, which reports [`ArenaError::StaleAllocation`] when
//! the range has been reclaimed since the descriptor was issued.
//!
//! Typed access is restricted to [`bytemuck::Pod`] types so that zeroed
//! and recycled memory is always a valid value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocation;
pub mod arena;
pub mod config;
pub mod error;
mod raw;

pub use allocation::{Allocation, ArenaId, Mark, TypedAllocation};
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
