//! Arena-backed slot storage with stable locators.
//!
//! [`SlotStore`] is a paged free-list store: elements never move, removed
//! slots are recycled most-recently-freed first, and every slot carries a
//! generation so that [`drift_core::Handle`]s can detect reuse.
//! [`EntityStore`] layers entity identifiers on top.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod entity;
pub mod error;
pub mod store;

pub use entity::EntityStore;
pub use error::{LocatorFault, SlotError};
pub use store::{LiveIter, SlotStore};
