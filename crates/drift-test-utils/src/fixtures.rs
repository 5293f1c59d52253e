//! Standard shapes in `[x y z w r g b a]` layout.
//!
//! - [`ship_vertices`]: one triangle pointing up +y.
//! - [`asteroid_vertices`]: unit hexagon as a six-triangle fan.
//! - [`laser_vertices`]: 2x2 white quad.

use std::f32::consts::TAU;

use drift_core::RenderableKind;
use drift_render::{RenderableError, RenderableTable, VertexBufferFactory};

fn push(out: &mut Vec<f32>, x: f32, y: f32, rgba: [f32; 4]) {
    out.extend_from_slice(&[x, y, 0.0, 1.0]);
    out.extend_from_slice(&rgba);
}

pub fn ship_vertices() -> Vec<f32> {
    let mut v = Vec::with_capacity(3 * 8);
    push(&mut v, 0.0, 0.7, [0.0, 1.0, 1.0, 1.0]);
    push(&mut v, 0.5, -0.7, [0.7, 1.0, 0.4, 1.0]);
    push(&mut v, -0.5, -0.7, [0.7, 1.0, 0.4, 1.0]);
    v
}

pub fn asteroid_vertices() -> Vec<f32> {
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    let mut v = Vec::with_capacity(18 * 8);
    for i in 0..6 {
        let (a0, a1) = (i as f32 * TAU / 6.0, (i + 1) as f32 * TAU / 6.0);
        push(&mut v, 0.0, 0.0, BLUE);
        push(&mut v, a0.cos(), a0.sin(), BLUE);
        push(&mut v, a1.cos(), a1.sin(), BLUE);
    }
    v
}

pub fn laser_vertices() -> Vec<f32> {
    const WHITE: [f32; 4] = [1.0; 4];
    let mut v = Vec::with_capacity(6 * 8);
    for (x, y) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
        push(&mut v, x, y, WHITE);
    }
    v
}

/// The standard shape for `kind`.
pub fn vertices_for(kind: RenderableKind) -> Vec<f32> {
    match kind {
        RenderableKind::Ship => ship_vertices(),
        RenderableKind::Asteroid => asteroid_vertices(),
        RenderableKind::Laser => laser_vertices(),
    }
}

/// A table with every kind built from its standard shape.
pub fn standard_table<F>(factory: &mut F) -> Result<RenderableTable, RenderableError>
where
    F: VertexBufferFactory + ?Sized,
{
    let mut table = RenderableTable::new();
    for kind in RenderableKind::ALL {
        table.get_or_build(kind, factory, &vertices_for(kind))?;
    }
    Ok(table)
}
