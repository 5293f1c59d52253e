//! Frame-synchronous memory orchestration.
//!
//! [`FrameMemory`] owns the two arenas of a simulation frame loop: a
//! persistent arena backing the entity slot pages, and a scratch arena
//! backing the render command stream that is reset every frame.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod frame;

pub use config::{ConfigError, FrameConfig};
pub use frame::{FrameError, FrameMemory, FrameParts, FrameStats};
