//! The record every simulation object embeds.

// `derive(Pod)` expands to `unsafe impl`s.
#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::handle::EntityId;
use crate::kind::RenderableKind;

/// Common state shared by ships, asteroids and lasers.
///
/// Plain-old-data so that it can live directly in arena-backed slot pages:
/// a zeroed record is a valid (if inert) entity.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct EntityBase {
    /// Identifier derived from the slot the record lives in.
    pub id: EntityId,
    renderable: u32,
    /// World position.
    pub position: Vec2,
    /// Units per second.
    pub velocity: Vec2,
    /// Radians, kept in `[-π, π)`.
    pub rotation: f32,
    /// Radians per second.
    pub angular_velocity: f32,
    /// Uniform scale factor.
    pub scale: f32,
}

impl EntityBase {
    /// The renderable this entity is drawn with, if any.
    pub fn renderable(&self) -> Option<RenderableKind> {
        RenderableKind::from_tag(self.renderable)
    }

    /// Set the renderable tag.
    pub fn set_renderable(&mut self, kind: RenderableKind) {
        self.renderable = kind.tag();
    }

    /// Model transform: translate, then rotate about Z, then scale.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.position.x, self.position.y, 0.0))
            * Mat4::from_rotation_z(self.rotation)
            * Mat4::from_scale(Vec3::new(self.scale, self.scale, 1.0))
    }

    /// Rotate by `radians`, wrapping into `[-π, π)`.
    pub fn rotate(&mut self, radians: f32) {
        self.rotation = wrap_angle(self.rotation + radians);
    }

    /// Advance position and rotation by `dt` seconds.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.rotate(self.angular_velocity * dt);
    }
}

fn wrap_angle(radians: f32) -> f32 {
    (radians + PI).rem_euclid(TAU) - PI
}
