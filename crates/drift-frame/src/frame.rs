//! The per-frame memory loop.
//!
//! ```text
//! begin_frame ── scratch.reset(), commands.clear()
//!   gameplay  ── create/destroy entities        (persistent arena)
//!   update    ── integrate live entities
//!   draw      ── push_command / draw_entities   (scratch arena)
//!   renderer  ── commands()                     (read only)
//! ```

use drift_arena::Arena;
use drift_core::{EntityBase, EntityId, Handle, RenderableKind};
use drift_render::{
    Command, CommandStream, Commands, DrawPolyline, DrawTriangles, NodeRef, Renderable,
    RenderableTable, SetUniforms, StreamError,
};
use drift_slots::{EntityStore, SlotError};
use glam::Mat4;
use thiserror::Error;
use tracing::trace;

use crate::config::{ConfigError, FrameConfig};

/// Errors raised while running a frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Entity storage failed.
    #[error("entities: {0}")]
    Slots(#[from] SlotError),
    /// Command recording failed.
    #[error("commands: {0}")]
    Stream(#[from] StreamError),
}

/// Point-in-time memory counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames begun so far.
    pub frame: u64,
    /// Live entities.
    pub entities: usize,
    /// Slot pages backing the entities.
    pub entity_pages: usize,
    /// Commands recorded this frame.
    pub commands: usize,
    /// Bytes in use in the persistent arena.
    pub persistent_used: usize,
    /// Persistent arena capacity.
    pub persistent_capacity: usize,
    /// Bytes in use in the scratch arena.
    pub scratch_used: usize,
    /// Largest scratch usage seen in any frame.
    pub scratch_high_water: usize,
    /// Scratch arena capacity.
    pub scratch_capacity: usize,
}

/// Mutable views of every component at once.
#[derive(Debug)]
pub struct FrameParts<'a> {
    /// Arena backing entity pages.
    pub persistent: &'a mut Arena,
    /// Arena backing this frame's commands.
    pub scratch: &'a mut Arena,
    /// Live entities.
    pub entities: &'a mut EntityStore,
    /// This frame's commands.
    pub commands: &'a mut CommandStream,
}

/// Persistent entity storage plus a per-frame command stream.
#[derive(Debug)]
pub struct FrameMemory {
    persistent: Arena,
    scratch: Arena,
    entities: EntityStore,
    commands: CommandStream,
    frame: u64,
}

impl FrameMemory {
    /// Validate `config` and create both arenas.
    pub fn new(config: FrameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            persistent: Arena::from_config(&config.persistent)?,
            scratch: Arena::from_config(&config.scratch)?,
            entities: EntityStore::new(),
            commands: CommandStream::new(),
            frame: 0,
        })
    }

    /// Start a new frame, discarding the previous frame's commands.
    ///
    /// Returns the new frame number (the first frame is 1).
    pub fn begin_frame(&mut self) -> u64 {
        self.scratch.reset();
        self.commands.clear();
        self.frame += 1;
        trace!(frame = self.frame, "frame begin");
        self.frame
    }

    /// Create an entity in persistent memory.
    pub fn create_entity(
        &mut self,
        kind: RenderableKind,
    ) -> Result<(Handle, &mut EntityBase), FrameError> {
        Ok(self.entities.create(&mut self.persistent, kind)?)
    }

    /// Destroy an entity by id.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), FrameError> {
        Ok(self.entities.destroy(id)?)
    }

    /// The entity a handle refers to.
    pub fn entity(&self, handle: Handle) -> Result<&EntityBase, FrameError> {
        Ok(self.entities.resolve(&self.persistent, handle)?)
    }

    /// Mutable form of [`entity`](Self::entity).
    pub fn entity_mut(&mut self, handle: Handle) -> Result<&mut EntityBase, FrameError> {
        Ok(self.entities.resolve_mut(&mut self.persistent, handle)?)
    }

    /// Advance every live entity by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Result<(), FrameError> {
        Ok(self.entities.integrate(&mut self.persistent, dt)?)
    }

    /// Record one command for this frame.
    pub fn push_command<C: Command>(&mut self, payload: C) -> Result<NodeRef, FrameError> {
        Ok(self.commands.append(&mut self.scratch, payload)?)
    }

    /// Record a view-projection change.
    pub fn set_view(&mut self, view_projection: Mat4) -> Result<NodeRef, FrameError> {
        self.push_command(SetUniforms {
            transform: view_projection,
        })
    }

    /// Record one triangle draw per live entity whose kind has a renderable.
    ///
    /// The `selected` entity, if any, is flagged for highlighting. Each append is
    /// atomic; on error the draws recorded before it remain. Returns the
    /// number of draws recorded.
    pub fn draw_entities(
        &mut self,
        renderables: &RenderableTable,
        selected: Option<EntityId>,
    ) -> Result<usize, FrameError> {
        self.draw_each(renderables, |entity, r| {
            DrawTriangles::new(entity.transform(), r.vertex_buffer, r.vertex_count)
                .with_selected(selected == Some(entity.id))
        })
    }

    /// Record one bounding-box outline per drawable live entity.
    pub fn draw_bounds(&mut self, renderables: &RenderableTable) -> Result<usize, FrameError> {
        self.draw_each(renderables, |entity, r| {
            DrawPolyline::new(
                entity.transform(),
                r.bounding_box_buffer,
                Renderable::OUTLINE_VERTEX_COUNT,
            )
        })
    }

    fn draw_each<C, F>(
        &mut self,
        renderables: &RenderableTable,
        mut make: F,
    ) -> Result<usize, FrameError>
    where
        C: Command,
        F: FnMut(&EntityBase, &Renderable) -> C,
    {
        let mut drawn = 0;
        for (_, entity) in self.entities.iter(&self.persistent)? {
            let Some(r) = entity.renderable().and_then(|kind| renderables.get(kind)) else {
                continue;
            };
            self.commands.append(&mut self.scratch, make(entity, r))?;
            drawn += 1;
        }
        Ok(drawn)
    }

    /// Walk this frame's commands.
    pub fn commands(&self) -> Commands<'_> {
        self.commands.iter(&self.scratch)
    }

    /// Current counters.
    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frame: self.frame,
            entities: self.entities.len(),
            entity_pages: self.entities.slots().page_count(),
            commands: self.commands.len(),
            persistent_used: self.persistent.used(),
            persistent_capacity: self.persistent.capacity(),
            scratch_used: self.scratch.used(),
            scratch_high_water: self.scratch.high_water(),
            scratch_capacity: self.scratch.capacity(),
        }
    }

    /// Borrow every component mutably at once.
    pub fn parts(&mut self) -> FrameParts<'_> {
        FrameParts {
            persistent: &mut self.persistent,
            scratch: &mut self.scratch,
            entities: &mut self.entities,
            commands: &mut self.commands,
        }
    }

    /// Current frame number (0 before the first `begin_frame`).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The persistent arena.
    pub fn persistent(&self) -> &Arena {
        &self.persistent
    }

    /// The scratch arena.
    pub fn scratch(&self) -> &Arena {
        &self.scratch
    }

    /// The entity store.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// This frame's command stream.
    pub fn command_stream(&self) -> &CommandStream {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_arena::ArenaError;
    use drift_render::{CommandKind, RenderCommand, VertexBufferHandle};
    use glam::Vec2;

    fn memory() -> FrameMemory {
        FrameMemory::new(FrameConfig::new(64 * 1024, 8 * 1024)).unwrap()
    }

    fn table() -> RenderableTable {
        let mut table = RenderableTable::new();
        table.insert(
            RenderableKind::Ship,
            Renderable {
                vertex_buffer: VertexBufferHandle(10),
                vertex_count: 3,
                bounding_box: Default::default(),
                bounding_box_buffer: VertexBufferHandle(11),
            },
        );
        table
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert!(matches!(
            FrameMemory::new(FrameConfig::new(0, 1024)),
            Err(ConfigError::Arena(ArenaError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn begin_frame_counts_and_clears() {
        let mut mem = memory();
        assert_eq!(mem.frame(), 0);
        assert_eq!(mem.begin_frame(), 1);
        mem.set_view(Mat4::IDENTITY).unwrap();
        assert_eq!(mem.commands().count(), 1);
        assert_eq!(mem.begin_frame(), 2);
        assert_eq!(mem.commands().count(), 0);
        assert_eq!(mem.stats().scratch_used, 0);
    }

    #[test]
    fn entities_survive_frames() {
        let mut mem = memory();
        mem.begin_frame();
        let (h, e) = mem.create_entity(RenderableKind::Ship).unwrap();
        e.velocity = Vec2::new(1.0, 0.0);
        for _ in 0..3 {
            mem.begin_frame();
            mem.update(1.0).unwrap();
        }
        assert_eq!(mem.entity(h).unwrap().position, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn draw_entities_skips_kinds_without_renderable() {
        let mut mem = memory();
        mem.begin_frame();
        let (ship, _) = mem.create_entity(RenderableKind::Ship).unwrap();
        mem.create_entity(RenderableKind::Asteroid).unwrap();
        mem.entity_mut(ship).unwrap().position = Vec2::new(2.0, 3.0);

        let drawn = mem.draw_entities(&table(), Some(ship.id())).unwrap();
        assert_eq!(drawn, 1);
        let cmds: Vec<RenderCommand> = mem
            .commands()
            .map(|n| n.and_then(|n| n.decode()))
            .collect::<Result<_, _>>()
            .unwrap();
        match cmds.as_slice() {
            [RenderCommand::DrawTriangles(d)] => {
                assert_eq!(d.vertex_buffer, VertexBufferHandle(10));
                assert!(d.is_selected());
                assert_eq!(d.transform.w_axis.truncate().truncate(), Vec2::new(2.0, 3.0));
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn draw_bounds_emits_outlines() {
        let mut mem = memory();
        mem.begin_frame();
        mem.create_entity(RenderableKind::Ship).unwrap();
        assert_eq!(mem.draw_bounds(&table()).unwrap(), 1);
        let node = mem.commands().next().unwrap().unwrap();
        assert_eq!(node.kind(), CommandKind::DrawPolyline);
        let poly = node.payload::<DrawPolyline>().unwrap();
        assert_eq!(poly.vertex_count, 5);
        assert_eq!(poly.vertex_buffer, VertexBufferHandle(11));
    }

    #[test]
    fn scratch_exhaustion_surfaces_as_stream_error() {
        let mut mem = FrameMemory::new(FrameConfig::new(64 * 1024, 256)).unwrap();
        mem.begin_frame();
        let err = loop {
            if let Err(err) = mem.set_view(Mat4::IDENTITY) {
                break err;
            }
        };
        assert!(matches!(
            err,
            FrameError::Stream(StreamError::Arena(ArenaError::OutOfMemory { .. }))
        ));
        // The next frame has the full scratch arena again.
        mem.begin_frame();
        assert!(mem.set_view(Mat4::IDENTITY).is_ok());
    }

    #[test]
    fn destroyed_entity_handle_is_stale() {
        let mut mem = memory();
        let (h, _) = mem.create_entity(RenderableKind::Laser).unwrap();
        mem.destroy_entity(h.id()).unwrap();
        assert!(matches!(
            mem.entity(h),
            Err(FrameError::Slots(SlotError::StaleHandle { .. }))
        ));
    }

    #[test]
    fn stats_track_both_arenas() {
        let mut mem = memory();
        mem.begin_frame();
        mem.create_entity(RenderableKind::Ship).unwrap();
        mem.set_view(Mat4::IDENTITY).unwrap();
        let stats = mem.stats();
        assert_eq!(stats.frame, 1);
        assert_eq!(stats.entities, 1);
        assert_eq!(stats.entity_pages, 1);
        assert_eq!(stats.commands, 1);
        assert!(stats.persistent_used >= 64 * std::mem::size_of::<EntityBase>());
        assert!(stats.scratch_used > 0);
        assert_eq!(stats.scratch_capacity, 8 * 1024);
    }

    #[test]
    fn parts_allow_direct_component_use() {
        let mut mem = memory();
        let parts = mem.parts();
        let (h, _) = parts.entities.create(parts.persistent, RenderableKind::Ship).unwrap();
        parts
            .commands
            .append(parts.scratch, SetUniforms { transform: Mat4::IDENTITY })
            .unwrap();
        assert!(mem.entity(h).is_ok());
        assert_eq!(mem.command_stream().len(), 1);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stats_track_population_across_frames(
                frames in proptest::collection::vec((0u8..8, 0u8..8), 1..40),
            ) {
                let mut mem = FrameMemory::new(FrameConfig::new(1 << 20, 64 * 1024)).unwrap();
                let renderables = table();
                let mut live: Vec<Handle> = Vec::new();
                let mut ships = 0usize;

                for (spawn, despawn) in frames {
                    mem.begin_frame();
                    for _ in 0..despawn.min(live.len() as u8) {
                        let h = live.remove(0);
                        if mem.entity(h).unwrap().renderable() == Some(RenderableKind::Ship) {
                            ships -= 1;
                        }
                        mem.destroy_entity(h.id()).unwrap();
                    }
                    for i in 0..spawn {
                        let kind = if i % 2 == 0 { RenderableKind::Ship } else { RenderableKind::Laser };
                        let (h, _) = mem.create_entity(kind).unwrap();
                        if kind == RenderableKind::Ship {
                            ships += 1;
                        }
                        live.push(h);
                    }
                    let drawn = mem.draw_entities(&renderables, None).unwrap();
                    prop_assert_eq!(drawn, ships);

                    let stats = mem.stats();
                    prop_assert_eq!(stats.entities, live.len());
                    prop_assert_eq!(stats.commands, ships);
                    prop_assert_eq!(mem.commands().count(), ships);
                }
            }
        }
    }
}
