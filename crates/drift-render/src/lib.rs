//! Per-frame render command streaming.
//!
//! Gameplay code appends commands to a [`CommandStream`] backed by a
//! scratch [`drift_arena::Arena`]; the renderer walks the stream once, read
//! only, before the arena is reset for the next frame. Shared geometry is
//! uploaded once per kind into a [`RenderableTable`].
//!
//! ```text
//! head ─▶ [header | SetUniforms] ─▶ [header | DrawTriangles] ◀─ tail
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod command;
pub mod error;
pub mod renderable;
pub mod stream;

pub use command::{
    Command, CommandKind, DrawPolyline, DrawText, DrawTriangles, FillMode, RenderCommand,
    SetOptions, SetUniforms, TextureHandle, VertexBufferHandle,
};
pub use error::{RenderableError, StreamError};
pub use renderable::{Rect, Renderable, RenderableTable, VertexBufferFactory, VERTEX_STRIDE};
pub use stream::{CommandRef, CommandStream, Commands, NodeRef};
