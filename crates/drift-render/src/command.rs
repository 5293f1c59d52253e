//! Render command payloads.
//!
//! Every command kind is a `#[repr(C)]` plain-old-data struct implementing
//! [`Command`]. The set of kinds is closed: [`CommandKind`] enumerates them
//! and [`RenderCommand`] is the decoded, tagged form a renderer matches on.

// `derive(Pod)` expands to `unsafe impl`s.
#![allow(unsafe_code)]

use std::fmt;

use bytemuck::{Pod, Zeroable};
use drift_arena::Allocation;
use glam::Mat4;

/// Opaque platform vertex buffer, passed through unchanged.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct VertexBufferHandle(pub u64);

/// Opaque platform texture, passed through unchanged.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct TextureHandle(pub u64);

/// Tag stored in every command node.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// [`SetOptions`].
    SetOptions = 1,
    /// [`SetUniforms`].
    SetUniforms = 2,
    /// [`DrawTriangles`].
    DrawTriangles = 3,
    /// [`DrawPolyline`].
    DrawPolyline = 4,
    /// [`DrawText`].
    DrawText = 5,
}

impl CommandKind {
    /// All kinds in tag order.
    pub const ALL: [CommandKind; 5] = [
        Self::SetOptions,
        Self::SetUniforms,
        Self::DrawTriangles,
        Self::DrawPolyline,
        Self::DrawText,
    ];

    /// Numeric tag written to node headers.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetOptions => "set-options",
            Self::SetUniforms => "set-uniforms",
            Self::DrawTriangles => "draw-triangles",
            Self::DrawPolyline => "draw-polyline",
            Self::DrawText => "draw-text",
        };
        f.write_str(name)
    }
}

/// A payload type that can be appended to a
/// [`CommandStream`](crate::CommandStream).
pub trait Command: Pod {
    /// The tag nodes of this type carry.
    const KIND: CommandKind;
}

/// Rasterizer fill mode.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    /// Filled polygons.
    #[default]
    Fill = 0,
    /// Edges only.
    Wireframe = 1,
}

/// Change global render state.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct SetOptions {
    fill_mode: u32,
}

impl SetOptions {
    /// Options selecting `fill_mode`.
    pub fn new(fill_mode: FillMode) -> Self {
        Self {
            fill_mode: fill_mode as u32,
        }
    }

    /// The requested fill mode, or `None` for an unrecognized value.
    pub fn fill_mode(&self) -> Option<FillMode> {
        match self.fill_mode {
            0 => Some(FillMode::Fill),
            1 => Some(FillMode::Wireframe),
            _ => None,
        }
    }
}

impl Command for SetOptions {
    const KIND: CommandKind = CommandKind::SetOptions;
}

/// Set the global (view-projection) transform.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SetUniforms {
    /// Column-major view-projection matrix.
    pub transform: Mat4,
}

impl Command for SetUniforms {
    const KIND: CommandKind = CommandKind::SetUniforms;
}

/// Draw a triangle list.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawTriangles {
    /// Model transform.
    pub transform: Mat4,
    /// Vertices to draw.
    pub vertex_buffer: VertexBufferHandle,
    /// Number of vertices in the buffer.
    pub vertex_count: u32,
    selected: u32,
}

impl DrawTriangles {
    /// An unselected draw.
    pub fn new(transform: Mat4, vertex_buffer: VertexBufferHandle, vertex_count: u32) -> Self {
        Self {
            transform,
            vertex_buffer,
            vertex_count,
            selected: 0,
        }
    }

    /// Mark the draw as selected (highlighted by the renderer).
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = u32::from(selected);
        self
    }

    /// Whether the draw is highlighted.
    pub fn is_selected(&self) -> bool {
        self.selected != 0
    }
}

impl Command for DrawTriangles {
    const KIND: CommandKind = CommandKind::DrawTriangles;
}

/// Draw a connected line strip.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawPolyline {
    /// Model transform.
    pub transform: Mat4,
    /// Vertices to draw.
    pub vertex_buffer: VertexBufferHandle,
    /// Number of vertices in the buffer.
    pub vertex_count: u32,
    _pad: u32,
}

impl DrawPolyline {
    /// A line strip over `vertex_count` vertices.
    pub fn new(transform: Mat4, vertex_buffer: VertexBufferHandle, vertex_count: u32) -> Self {
        Self {
            transform,
            vertex_buffer,
            vertex_count,
            _pad: 0,
        }
    }
}

impl Command for DrawPolyline {
    const KIND: CommandKind = CommandKind::DrawPolyline;
}

/// Draw textured glyph quads.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawText {
    /// Model transform.
    pub transform: Mat4,
    /// Number of glyph quads.
    pub quad_count: u32,
    _pad: u32,
    /// Quad vertices.
    pub quads: VertexBufferHandle,
    /// Quad indices.
    pub indices: VertexBufferHandle,
    /// Glyph atlas.
    pub texels: TextureHandle,
}

impl DrawText {
    /// A text draw of `quad_count` glyphs.
    pub fn new(
        transform: Mat4,
        quad_count: u32,
        quads: VertexBufferHandle,
        indices: VertexBufferHandle,
        texels: TextureHandle,
    ) -> Self {
        Self {
            transform,
            quad_count,
            _pad: 0,
            quads,
            indices,
            texels,
        }
    }
}

impl Command for DrawText {
    const KIND: CommandKind = CommandKind::DrawText;
}

/// A decoded command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderCommand {
    /// See [`SetOptions`].
    SetOptions(SetOptions),
    /// See [`SetUniforms`].
    SetUniforms(SetUniforms),
    /// See [`DrawTriangles`].
    DrawTriangles(DrawTriangles),
    /// See [`DrawPolyline`].
    DrawPolyline(DrawPolyline),
    /// See [`DrawText`].
    DrawText(DrawText),
}

impl RenderCommand {
    /// The kind tag of the wrapped payload.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SetOptions(_) => CommandKind::SetOptions,
            Self::SetUniforms(_) => CommandKind::SetUniforms,
            Self::DrawTriangles(_) => CommandKind::DrawTriangles,
            Self::DrawPolyline(_) => CommandKind::DrawPolyline,
            Self::DrawText(_) => CommandKind::DrawText,
        }
    }
}

macro_rules! impl_from_payload {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for RenderCommand {
                fn from(payload: $ty) -> Self {
                    Self::$ty(payload)
                }
            }
        )*
    };
}

impl_from_payload!(SetOptions, SetUniforms, DrawTriangles, DrawPolyline, DrawText);

/// Fixed prefix of every command node.
///
/// The payload follows at `payload_offset`, aligned for its type. `next`
/// is [`Allocation::NULL`] on the last node.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct NodeHeader {
    pub(crate) kind: u32,
    pub(crate) payload_offset: u32,
    pub(crate) payload_len: u32,
    pub(crate) _pad: u32,
    pub(crate) next: Allocation,
}

impl NodeHeader {
    pub(crate) const SIZE: usize = std::mem::size_of::<NodeHeader>();

    pub(crate) fn new(kind: CommandKind, payload_offset: usize, payload_len: usize) -> Self {
        Self {
            kind: kind.tag(),
            payload_offset: payload_offset as u32,
            payload_len: payload_len as u32,
            _pad: 0,
            next: Allocation::NULL,
        }
    }
}
