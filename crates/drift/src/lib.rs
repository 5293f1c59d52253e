//! Drift: allocation-free frame memory for real-time simulations.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! drift sub-crates. For most users, adding `drift` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use drift::prelude::*;
//!
//! let mut memory = FrameMemory::new(FrameConfig::default()).unwrap();
//!
//! memory.begin_frame();
//! let (ship, base) = memory.create_entity(RenderableKind::Ship).unwrap();
//! base.angular_velocity = 1.0;
//! memory.update(1.0 / 60.0).unwrap();
//!
//! memory.push_command(SetOptions::new(FillMode::Wireframe)).unwrap();
//! assert_eq!(memory.commands().count(), 1);
//! assert!(memory.entity(ship).unwrap().rotation > 0.0);
//!
//! // Next frame: commands are gone, entities persist.
//! memory.begin_frame();
//! assert_eq!(memory.commands().count(), 0);
//! assert_eq!(memory.stats().entities, 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `drift-core` | Locators, handles, identifiers, entity record |
//! | [`arena`] | `drift-arena` | Bump arenas, allocation descriptors, marks |
//! | [`slots`] | `drift-slots` | Paged slot stores and entity storage |
//! | [`render`] | `drift-render` | Command streams, payloads, renderables |
//! | [`frame`] | `drift-frame` | Per-frame orchestration of both arenas |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and shared records (`drift-core`).
///
/// Contains [`types::Locator`], [`types::Handle`], the
/// [`types::encode`]/[`types::decode`] pair and [`types::EntityBase`].
pub use drift_core as types;

/// Bump-pointer arenas (`drift-arena`).
pub use drift_arena as arena;

/// Slot stores (`drift-slots`).
///
/// [`slots::SlotStore`] for any plain-old-data element type and
/// [`slots::EntityStore`] for [`types::EntityBase`] records.
pub use drift_slots as slots;

/// Render command streaming (`drift-render`).
pub use drift_render as render;

/// Frame orchestration (`drift-frame`).
pub use drift_frame as frame;

/// Common imports for typical drift usage.
///
/// ```rust
/// use drift::prelude::*;
/// ```
pub mod prelude {
    // Identity
    pub use drift_core::{
        decode, encode, EntityBase, EntityId, Handle, Locator, RenderableKind, PAGE_SIZE,
    };

    // Memory
    pub use drift_arena::{Allocation, Arena, ArenaConfig, TypedAllocation};
    pub use drift_slots::{EntityStore, SlotStore};

    // Rendering
    pub use drift_render::{
        Command, CommandKind, CommandStream, DrawPolyline, DrawText, DrawTriangles, FillMode,
        RenderCommand, Renderable, RenderableTable, SetOptions, SetUniforms,
        VertexBufferFactory, VertexBufferHandle,
    };

    // Frame loop
    pub use drift_frame::{FrameConfig, FrameMemory, FrameStats};

    // Errors
    pub use drift_arena::ArenaError;
    pub use drift_frame::{ConfigError, FrameError};
    pub use drift_render::{RenderableError, StreamError};
    pub use drift_slots::SlotError;
}
