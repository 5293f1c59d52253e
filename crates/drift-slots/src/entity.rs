//! Entity storage on top of [`SlotStore`].

use drift_arena::Arena;
use drift_core::{decode, EntityBase, EntityId, Handle, Locator, RenderableKind};
use tracing::trace;

use crate::error::SlotError;
use crate::store::{LiveIter, SlotStore};

/// Live entities, addressed by [`EntityId`] or by generation-checked
/// [`Handle`].
///
/// Lookups by id check that the slot is live but cannot tell a reused slot
/// from the original; handles can.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: SlotStore<EntityBase>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            slots: SlotStore::new(),
        }
    }

    /// Create an entity drawn with `kind`.
    ///
    /// The record starts zeroed apart from its id, its renderable tag and
    /// a unit scale.
    pub fn create<'a>(
        &mut self,
        arena: &'a mut Arena,
        kind: RenderableKind,
    ) -> Result<(Handle, &'a mut EntityBase), SlotError> {
        let (handle, base) = self.slots.insert(arena)?;
        base.id = handle.id();
        base.scale = 1.0;
        base.set_renderable(kind);
        trace!(id = base.id, %kind, "entity created");
        Ok((handle, base))
    }

    /// Destroy the entity with the given id.
    pub fn destroy(&mut self, id: EntityId) -> Result<(), SlotError> {
        self.slots.remove(decode(id))?;
        trace!(id, "entity destroyed");
        Ok(())
    }

    /// Destroy the entity a handle refers to, failing if it is stale.
    pub fn destroy_handle(&mut self, handle: Handle) -> Result<(), SlotError> {
        self.slots.check_handle(handle)?;
        self.destroy(handle.id())
    }

    /// The live entity with the given id.
    pub fn get<'a>(&self, arena: &'a Arena, id: EntityId) -> Result<&'a EntityBase, SlotError> {
        let locator = self.live_locator(id)?;
        self.slots.get(arena, locator)
    }

    /// Mutable form of [`get`](Self::get).
    pub fn get_mut<'a>(
        &self,
        arena: &'a mut Arena,
        id: EntityId,
    ) -> Result<&'a mut EntityBase, SlotError> {
        let locator = self.live_locator(id)?;
        self.slots.get_mut(arena, locator)
    }

    /// The entity a handle was issued for, if it still exists.
    pub fn resolve<'a>(&self, arena: &'a Arena, handle: Handle) -> Result<&'a EntityBase, SlotError> {
        self.slots.get_live(arena, handle)
    }

    /// Mutable form of [`resolve`](Self::resolve).
    pub fn resolve_mut<'a>(
        &self,
        arena: &'a mut Arena,
        handle: Handle,
    ) -> Result<&'a mut EntityBase, SlotError> {
        self.slots.get_live_mut(arena, handle)
    }

    /// Live entities in storage order.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> Result<LiveIter<'a, EntityBase>, SlotError> {
        self.slots.iter(arena)
    }

    /// Call `f` on every live entity.
    pub fn for_each_mut<F>(&self, arena: &mut Arena, mut f: F) -> Result<(), SlotError>
    where
        F: FnMut(&mut EntityBase),
    {
        self.slots.for_each_live_mut(arena, |_, base| f(base))
    }

    /// Advance every live entity by `dt` seconds.
    pub fn integrate(&self, arena: &mut Arena, dt: f32) -> Result<(), SlotError> {
        self.for_each_mut(arena, |base| base.integrate(dt))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no entities are live.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The underlying slot store.
    pub fn slots(&self) -> &SlotStore<EntityBase> {
        &self.slots
    }

    fn live_locator(&self, id: EntityId) -> Result<Locator, SlotError> {
        let locator = decode(id);
        self.slots.check_live(locator)?;
        Ok(locator)
    }
}
