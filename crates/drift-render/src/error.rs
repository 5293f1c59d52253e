//! Render-layer error types.

use drift_arena::ArenaError;
use thiserror::Error;

use crate::command::CommandKind;

/// Errors from [`CommandStream`](crate::CommandStream) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The backing arena refused the request (usually out of memory).
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// A node was reclaimed by an arena reset while the stream still
    /// referenced it. Clear the stream whenever its arena is reset.
    #[error("command node at offset {offset} was reclaimed by an arena reset")]
    Stale {
        /// Arena offset of the reclaimed node.
        offset: usize,
    },
    /// A node carries a tag outside [`CommandKind`].
    #[error("unknown command tag {tag}")]
    UnknownKind {
        /// The raw tag.
        tag: u32,
    },
    /// A node's payload was read as the wrong type.
    #[error("command is {actual}, not {expected}")]
    KindMismatch {
        /// The type asked for.
        expected: CommandKind,
        /// The node's actual kind.
        actual: CommandKind,
    },
    /// A node header describes a payload outside its allocation.
    #[error("malformed command node at offset {offset}")]
    Malformed {
        /// Arena offset of the node.
        offset: usize,
    },
}

/// Errors from building a [`Renderable`](crate::Renderable).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RenderableError {
    /// Vertex data is not a whole number of `[x y z w r g b a]` records.
    #[error("vertex data has {len} floats, not a multiple of {stride}")]
    BadVertexLayout {
        /// Number of floats supplied.
        len: usize,
        /// Floats per vertex.
        stride: usize,
    },
    /// More vertices than a draw command can address.
    #[error("{count} vertices exceed the per-draw limit")]
    TooManyVertices {
        /// Number of vertices supplied.
        count: usize,
    },
}
