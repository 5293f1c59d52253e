//! Core types for the drift frame substrate.
//!
//! This is the leaf crate with zero internal dependencies. It owns the
//! process-wide constants that every other crate must agree on: the slot
//! page size, the identifier encoding, and the renderable tag table.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod entity;
pub mod handle;
pub mod kind;

pub use entity::EntityBase;
pub use handle::{
    decode, encode, EntityId, Handle, Locator, INVALID_ENTITY_ID, MAX_PAGES, PAGE_SIZE,
};
pub use kind::RenderableKind;
