//! Shared drawable geometry.
//!
//! A [`Renderable`] is built once per [`RenderableKind`] from interleaved
//! vertex data and then referenced by every entity of that kind.

use drift_core::RenderableKind;
use glam::Vec2;
use tracing::debug;

use crate::command::VertexBufferHandle;
use crate::error::RenderableError;

/// Floats per vertex: position `x y z w` then colour `r g b a`.
pub const VERTEX_STRIDE: usize = 8;

/// Creates platform vertex buffers.
pub trait VertexBufferFactory {
    /// Upload interleaved `[x y z w r g b a]` vertices.
    fn create_vertex_buffer(&mut self, vertices: &[f32]) -> VertexBufferHandle;
}

impl<F: VertexBufferFactory + ?Sized> VertexBufferFactory for &mut F {
    fn create_vertex_buffer(&mut self, vertices: &[f32]) -> VertexBufferHandle {
        (**self).create_vertex_buffer(vertices)
    }
}

/// Axis-aligned rectangle, `(x, y)` being the minimum corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Minimum x.
    pub x: f32,
    /// Minimum y.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Minimum corner.
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }
}

/// Uploaded geometry plus its bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Renderable {
    /// The uploaded vertices.
    pub vertex_buffer: VertexBufferHandle,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Bounds of the vertex positions, always including the origin.
    pub bounding_box: Rect,
    /// Closed white outline of `bounding_box` (5 vertices).
    pub bounding_box_buffer: VertexBufferHandle,
}

impl Renderable {
    /// Vertices in [`bounding_box_buffer`](Self::bounding_box_buffer).
    pub const OUTLINE_VERTEX_COUNT: u32 = 5;

    /// Upload `vertices` and an outline of their bounds.
    pub fn build<F>(factory: &mut F, vertices: &[f32]) -> Result<Self, RenderableError>
    where
        F: VertexBufferFactory + ?Sized,
    {
        if vertices.len() % VERTEX_STRIDE != 0 {
            return Err(RenderableError::BadVertexLayout {
                len: vertices.len(),
                stride: VERTEX_STRIDE,
            });
        }
        let count = vertices.len() / VERTEX_STRIDE;
        let vertex_count =
            u32::try_from(count).map_err(|_| RenderableError::TooManyVertices { count })?;

        let (min, max) = vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| Vec2::new(v[0], v[1]))
            .fold((Vec2::ZERO, Vec2::ZERO), |(lo, hi), p| (lo.min(p), hi.max(p)));

        let vertex_buffer = factory.create_vertex_buffer(vertices);
        let bounding_box_buffer = factory.create_vertex_buffer(&outline(min, max));
        debug!(vertex_count, ?min, ?max, "renderable built");

        Ok(Self {
            vertex_buffer,
            vertex_count,
            bounding_box: Rect {
                x: min.x,
                y: min.y,
                w: max.x - min.x,
                h: max.y - min.y,
            },
            bounding_box_buffer,
        })
    }
}

/// Closed line strip around `[min, max]`, white, starting at `min`.
fn outline(min: Vec2, max: Vec2) -> [f32; 5 * VERTEX_STRIDE] {
    let corners = [
        min,
        Vec2::new(min.x, max.y),
        max,
        Vec2::new(max.x, min.y),
        min,
    ];
    let mut out = [0.0; 5 * VERTEX_STRIDE];
    for (chunk, c) in out.chunks_exact_mut(VERTEX_STRIDE).zip(corners) {
        chunk.copy_from_slice(&[c.x, c.y, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }
    out
}

/// One optional [`Renderable`] per [`RenderableKind`].
#[derive(Clone, Debug, Default)]
pub struct RenderableTable {
    slots: [Option<Renderable>; RenderableKind::COUNT],
}

impl RenderableTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The renderable registered for `kind`.
    pub fn get(&self, kind: RenderableKind) -> Option<&Renderable> {
        self.slots[kind.index()].as_ref()
    }

    /// Register `renderable` for `kind`, returning the previous one.
    pub fn insert(&mut self, kind: RenderableKind, renderable: Renderable) -> Option<Renderable> {
        self.slots[kind.index()].replace(renderable)
    }

    /// The renderable for `kind`, building it from `vertices` on first use.
    ///
    /// Later calls return the cached renderable and ignore `vertices`.
    pub fn get_or_build<F>(
        &mut self,
        kind: RenderableKind,
        factory: &mut F,
        vertices: &[f32],
    ) -> Result<&Renderable, RenderableError>
    where
        F: VertexBufferFactory + ?Sized,
    {
        let slot = &mut self.slots[kind.index()];
        let renderable = match *slot {
            Some(existing) => existing,
            None => Renderable::build(factory, vertices)?,
        };
        Ok(slot.insert(renderable))
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered `(kind, renderable)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (RenderableKind, &Renderable)> + '_ {
        RenderableKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|r| (kind, r)))
    }
}
