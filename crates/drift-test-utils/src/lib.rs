//! Test utilities and mock types for drift development.
//!
//! Provides a recording implementation of [`VertexBufferFactory`] and the
//! standard shape fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use drift_render::{VertexBufferFactory, VertexBufferHandle};

/// Mock implementation of [`VertexBufferFactory`].
///
/// Hands out sequential handles starting at 1 and keeps a copy of every
/// upload so tests can inspect what the code under test sent.
#[derive(Debug, Default)]
pub struct RecordingVertexBuffers {
    uploads: Vec<Vec<f32>>,
}

impl RecordingVertexBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers created so far.
    pub fn count(&self) -> usize {
        self.uploads.len()
    }

    /// The vertices uploaded for `handle`, if it was issued here.
    pub fn vertices(&self, handle: VertexBufferHandle) -> Option<&[f32]> {
        let index = usize::try_from(handle.0).ok()?.checked_sub(1)?;
        self.uploads.get(index).map(Vec::as_slice)
    }

    /// Every upload in creation order.
    pub fn uploads(&self) -> &[Vec<f32>] {
        &self.uploads
    }
}

impl VertexBufferFactory for RecordingVertexBuffers {
    fn create_vertex_buffer(&mut self, vertices: &[f32]) -> VertexBufferHandle {
        self.uploads.push(vertices.to_vec());
        VertexBufferHandle(self.uploads.len() as u64)
    }
}
