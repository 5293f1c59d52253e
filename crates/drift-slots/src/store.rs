//! Paged, slot-recycling storage.
//!
//! [`SlotStore`] keeps its elements in fixed pages of [`PAGE_SIZE`] slots,
//! each page one allocation from an [`Arena`]. Removed slots go onto a free
//! list and are handed out again (most recently freed first) before any new
//! page is allocated. Nothing is ever moved, so an element's [`Locator`]
//! stays valid for as long as the element lives.
//!
//! The store holds only descriptors; every access takes the backing arena
//! explicitly. Passing a different arena, or one that has been reset since
//! the pages were allocated, surfaces as [`SlotError::Arena`].

use std::fmt;
use std::iter::FusedIterator;

use bytemuck::Pod;
use drift_arena::{Arena, TypedAllocation};
use drift_core::{Handle, Locator, MAX_PAGES, PAGE_SIZE};
use tracing::debug;

use crate::error::{LocatorFault, SlotError};

/// Per-slot bookkeeping, kept outside the arena pages.
#[derive(Clone, Copy, Debug, Default)]
struct SlotMeta {
    /// Bumped on every removal.
    generation: u32,
    live: bool,
}

/// A growable collection of arena-backed slot pages.
pub struct SlotStore<T> {
    /// One `PAGE_SIZE`-element allocation per page.
    pages: Vec<TypedAllocation<T>>,
    /// Indexed by `Locator::index()`.
    meta: Vec<SlotMeta>,
    /// Locators available for reuse; the last entry is handed out next.
    free_list: Vec<Locator>,
    len: usize,
}

impl<T: Pod> SlotStore<T> {
    /// Create an empty store. No memory is taken until the first insert.
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            meta: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Claim a slot, growing by one page if the free list is empty.
    ///
    /// The slot is zeroed before it is returned. If growth fails the store
    /// is left exactly as it was. An arena other than the one backing the
    /// existing pages is rejected before anything is allocated.
    pub fn insert<'a>(&mut self, arena: &'a mut Arena) -> Result<(Handle, &'a mut T), SlotError> {
        let locator = match self.free_list.last() {
            Some(&locator) => locator,
            None => self.grow(arena)?,
        };

        let slots = arena.slice_mut(&self.pages[locator.page as usize])?;
        let value = &mut slots[locator.slot as usize];
        *value = T::zeroed();

        self.free_list.pop();
        let meta = &mut self.meta[locator.index()];
        meta.live = true;
        self.len += 1;
        Ok((Handle::new(locator, meta.generation), value))
    }

    /// Release a live slot for reuse.
    ///
    /// The slot's memory is left as-is until the next insert reuses it.
    pub fn remove(&mut self, locator: Locator) -> Result<(), SlotError> {
        self.check_live(locator)?;
        let meta = &mut self.meta[locator.index()];
        meta.live = false;
        meta.generation = meta.generation.wrapping_add(1);
        self.free_list.push(locator);
        self.len -= 1;
        Ok(())
    }

    /// The slot at `locator`, without a liveness check.
    ///
    /// A locator whose element was removed and whose slot was reused
    /// silently resolves to the new occupant. Use
    /// [`get_live`](Self::get_live) to have that detected.
    pub fn get<'a>(&self, arena: &'a Arena, locator: Locator) -> Result<&'a T, SlotError> {
        self.check_range(locator)?;
        let slots = arena.slice(&self.pages[locator.page as usize])?;
        Ok(&slots[locator.slot as usize])
    }

    /// Mutable form of [`get`](Self::get).
    pub fn get_mut<'a>(
        &self,
        arena: &'a mut Arena,
        locator: Locator,
    ) -> Result<&'a mut T, SlotError> {
        self.check_range(locator)?;
        let slots = arena.slice_mut(&self.pages[locator.page as usize])?;
        Ok(&mut slots[locator.slot as usize])
    }

    /// The element a handle was issued for, if it is still alive.
    pub fn get_live<'a>(&self, arena: &'a Arena, handle: Handle) -> Result<&'a T, SlotError> {
        self.check_handle(handle)?;
        self.get(arena, handle.locator())
    }

    /// Mutable form of [`get_live`](Self::get_live).
    pub fn get_live_mut<'a>(
        &self,
        arena: &'a mut Arena,
        handle: Handle,
    ) -> Result<&'a mut T, SlotError> {
        self.check_handle(handle)?;
        self.get_mut(arena, handle.locator())
    }

    /// Lazily visit live slots in page-then-slot order.
    ///
    /// All pages are checked against the arena up front.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> Result<LiveIter<'a, T>, SlotError> {
        for page in &self.pages {
            arena.check(&page.raw())?;
        }
        Ok(LiveIter {
            arena,
            pages: &self.pages,
            meta: &self.meta,
            next: 0,
            page_index: usize::MAX,
            page: &[],
            remaining: self.len,
        })
    }

    /// Call `f` on every live slot, in page-then-slot order.
    ///
    /// If any page is stale nothing is visited.
    pub fn for_each_live_mut<F>(&self, arena: &mut Arena, mut f: F) -> Result<(), SlotError>
    where
        F: FnMut(Locator, &mut T),
    {
        for page in &self.pages {
            arena.check(&page.raw())?;
        }
        for (page_index, (page, meta)) in self
            .pages
            .iter()
            .zip(self.meta.chunks_exact(PAGE_SIZE))
            .enumerate()
        {
            if !meta.iter().any(|m| m.live) {
                continue;
            }
            let slots = arena.slice_mut(page)?;
            for (slot, (value, m)) in slots.iter_mut().zip(meta).enumerate() {
                if m.live {
                    f(Locator::new(page_index as u32, slot as u32), value);
                }
            }
        }
        Ok(())
    }

    /// Verify that `locator` is in range and holds a live element.
    pub fn check_live(&self, locator: Locator) -> Result<(), SlotError> {
        let index = self.check_range(locator)?;
        if !self.meta[index].live {
            return Err(SlotError::InvalidLocator {
                locator,
                reason: LocatorFault::NotLive,
            });
        }
        Ok(())
    }

    /// Verify that `handle` names a live slot of the same generation.
    pub fn check_handle(&self, handle: Handle) -> Result<(), SlotError> {
        let index = self.check_range(handle.locator())?;
        let meta = self.meta[index];
        if !meta.live || meta.generation != handle.generation() {
            return Err(SlotError::StaleHandle {
                handle,
                current: meta.generation,
            });
        }
        Ok(())
    }

    /// Whether `locator` currently holds a live element.
    pub fn is_live(&self, locator: Locator) -> bool {
        self.check_range(locator)
            .map(|index| self.meta[index].live)
            .unwrap_or(false)
    }

    /// A fresh handle for a live locator.
    pub fn handle_of(&self, locator: Locator) -> Option<Handle> {
        let index = self.check_range(locator).ok()?;
        let meta = self.meta[index];
        meta.live.then(|| Handle::new(locator, meta.generation))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of pages allocated so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of slots on the free list.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Total slots across all pages.
    pub fn capacity(&self) -> usize {
        self.pages.len() * PAGE_SIZE
    }

    fn check_range(&self, locator: Locator) -> Result<usize, SlotError> {
        if locator.page as usize >= self.pages.len() {
            return Err(SlotError::InvalidLocator {
                locator,
                reason: LocatorFault::PageOutOfRange {
                    pages: self.pages.len() as u32,
                },
            });
        }
        if locator.slot as usize >= PAGE_SIZE {
            return Err(SlotError::InvalidLocator {
                locator,
                reason: LocatorFault::SlotOutOfRange,
            });
        }
        Ok(locator.index())
    }

    /// Append one page and push its slots so that slot 0 is popped first.
    fn grow(&mut self, arena: &mut Arena) -> Result<Locator, SlotError> {
        let page_index = match u32::try_from(self.pages.len()) {
            Ok(n) if n < MAX_PAGES => n,
            _ => return Err(SlotError::PageLimit { pages: MAX_PAGES }),
        };
        // New pages must come from the arena that backs the existing ones.
        for page in &self.pages {
            arena.check(&page.raw())?;
        }
        let page = arena.allocate_array::<T>(PAGE_SIZE)?;
        debug!(
            page = page_index,
            bytes = page.raw().len(),
            arena = arena.label(),
            "slot store grew"
        );
        self.pages.push(page);
        self.meta
            .resize(self.meta.len() + PAGE_SIZE, SlotMeta::default());
        self.free_list.extend(
            (0..PAGE_SIZE as u32)
                .rev()
                .map(|slot| Locator::new(page_index, slot)),
        );
        Ok(Locator::new(page_index, 0))
    }
}

impl<T: Pod> Default for SlotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStore")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.len)
            .field("pages", &self.pages.len())
            .field("free", &self.free_list.len())
            .finish()
    }
}

/// Iterator over the live slots of a [`SlotStore`].
///
/// Produced by [`SlotStore::iter`]. Yields `(locator, &element)`.
pub struct LiveIter<'a, T> {
    arena: &'a Arena,
    pages: &'a [TypedAllocation<T>],
    meta: &'a [SlotMeta],
    /// Next flat slot index to inspect.
    next: usize,
    /// Page whose slice is cached in `page`.
    page_index: usize,
    page: &'a [T],
    remaining: usize,
}

impl<'a, T: Pod> Iterator for LiveIter<'a, T> {
    type Item = (Locator, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.meta.len() {
            let index = self.next;
            self.next += 1;
            if !self.meta[index].live {
                continue;
            }
            let (page, slot) = (index / PAGE_SIZE, index % PAGE_SIZE);
            if page != self.page_index {
                // Pages were checked when the iterator was built.
                match self.arena.slice(&self.pages[page]) {
                    Ok(slice) => {
                        self.page = slice;
                        self.page_index = page;
                    }
                    Err(_) => {
                        self.next = self.meta.len();
                        return None;
                    }
                }
            }
            self.remaining -= 1;
            return Some((Locator::new(page as u32, slot as u32), &self.page[slot]));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<T: Pod> FusedIterator for LiveIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_arena::ArenaError;

    fn arena() -> Arena {
        Arena::new(64 * 1024)
    }

    #[test]
    fn first_inserts_fill_page_zero_in_order() {
        let mut arena = arena();
        let mut store = SlotStore::<u64>::new();
        let locs: Vec<Locator> = (0..3)
            .map(|_| store.insert(&mut arena).unwrap().0.locator())
            .collect();
        assert_eq!(
            locs,
            vec![Locator::new(0, 0), Locator::new(0, 1), Locator::new(0, 2)]
        );
        assert_eq!(store.page_count(), 1);
        assert_eq!(store.free_count(), PAGE_SIZE - 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn removed_slot_is_reused_first() {
        let mut arena = arena();
        let mut store = SlotStore::<u64>::new();
        for _ in 0..3 {
            store.insert(&mut arena).unwrap();
        }
        store.remove(Locator::new(0, 1)).unwrap();
        let (handle, _) = store.insert(&mut arena).unwrap();
        assert_eq!(handle.locator(), Locator::new(0, 1));
        assert_eq!(handle.id(), 1);
        assert_eq!(handle.generation(), 1);
    }

    #[test]
    fn double_remove_is_invalid() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        let (h, _) = store.insert(&mut arena).unwrap();
        store.remove(h.locator()).unwrap();
        assert_eq!(
            store.remove(h.locator()),
            Err(SlotError::InvalidLocator {
                locator: h.locator(),
                reason: LocatorFault::NotLive,
            })
        );
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn out_of_range_locators_rejected() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        store.insert(&mut arena).unwrap();
        assert!(matches!(
            store.get(&arena, Locator::new(1, 0)),
            Err(SlotError::InvalidLocator {
                reason: LocatorFault::PageOutOfRange { pages: 1 },
                ..
            })
        ));
        assert!(matches!(
            store.get(&arena, Locator::new(0, PAGE_SIZE as u32)),
            Err(SlotError::InvalidLocator {
                reason: LocatorFault::SlotOutOfRange,
                ..
            })
        ));
    }

    #[test]
    fn inserted_slot_is_zeroed_after_reuse() {
        let mut arena = arena();
        let mut store = SlotStore::<u64>::new();
        let (h, v) = store.insert(&mut arena).unwrap();
        *v = 0xDEAD_BEEF;
        store.remove(h.locator()).unwrap();
        let (h2, v2) = store.insert(&mut arena).unwrap();
        assert_eq!(h2.locator(), h.locator());
        assert_eq!(*v2, 0);
    }

    #[test]
    fn get_ignores_liveness_but_get_live_does_not() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        let (old, v) = store.insert(&mut arena).unwrap();
        *v = 7;
        store.remove(old.locator()).unwrap();
        let (new, v) = store.insert(&mut arena).unwrap();
        *v = 9;

        // Plain lookup aliases the new occupant.
        assert_eq!(*store.get(&arena, old.locator()).unwrap(), 9);
        // Checked lookup spots the reuse.
        assert!(matches!(
            store.get_live(&arena, old),
            Err(SlotError::StaleHandle { current: 1, .. })
        ));
        assert_eq!(*store.get_live(&arena, new).unwrap(), 9);
    }

    #[test]
    fn grows_a_second_page_when_first_is_full() {
        let mut arena = arena();
        let mut store = SlotStore::<u16>::new();
        for _ in 0..PAGE_SIZE {
            store.insert(&mut arena).unwrap();
        }
        assert_eq!(store.free_count(), 0);
        let (h, _) = store.insert(&mut arena).unwrap();
        assert_eq!(h.locator(), Locator::new(1, 0));
        assert_eq!(h.id(), PAGE_SIZE as u64);
        assert_eq!(store.page_count(), 2);
        assert_eq!(store.capacity(), 2 * PAGE_SIZE);
    }

    #[test]
    fn failed_growth_leaves_store_unchanged() {
        // Room for exactly one page of u64.
        let mut arena = Arena::new(PAGE_SIZE * 8);
        let mut store = SlotStore::<u64>::new();
        for _ in 0..PAGE_SIZE {
            store.insert(&mut arena).unwrap();
        }
        let err = store.insert(&mut arena).unwrap_err();
        assert!(matches!(
            err,
            SlotError::Arena(ArenaError::OutOfMemory { .. })
        ));
        assert_eq!(store.page_count(), 1);
        assert_eq!(store.len(), PAGE_SIZE);
        assert_eq!(store.free_count(), 0);
    }

    #[test]
    fn growth_from_another_arena_is_rejected() {
        let mut a = arena();
        let mut b = arena();
        let mut store = SlotStore::<u32>::new();
        for _ in 0..PAGE_SIZE {
            store.insert(&mut a).unwrap();
        }

        let err = store.insert(&mut b).unwrap_err();
        assert!(matches!(
            err,
            SlotError::Arena(ArenaError::ForeignAllocation)
        ));
        assert_eq!(b.used(), 0);
        assert_eq!(store.page_count(), 1);
        assert_eq!(store.len(), PAGE_SIZE);

        // The store still works against its own arena.
        assert_eq!(store.iter(&a).unwrap().count(), PAGE_SIZE);
        let (h, _) = store.insert(&mut a).unwrap();
        assert_eq!(h.locator(), Locator::new(1, 0));
    }

    #[test]
    fn reuse_from_another_arena_is_rejected() {
        let mut a = arena();
        let mut b = arena();
        let mut store = SlotStore::<u32>::new();
        let (h, _) = store.insert(&mut a).unwrap();
        store.remove(h.locator()).unwrap();
        let free = store.free_count();

        assert!(matches!(
            store.insert(&mut b),
            Err(SlotError::Arena(ArenaError::ForeignAllocation))
        ));
        assert_eq!(store.free_count(), free);
        assert!(store.is_empty());
    }

    #[test]
    fn growth_after_arena_reset_is_rejected() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        for _ in 0..PAGE_SIZE {
            store.insert(&mut arena).unwrap();
        }
        arena.reset();
        assert!(matches!(
            store.insert(&mut arena),
            Err(SlotError::Arena(ArenaError::StaleAllocation { .. }))
        ));
        assert_eq!(store.page_count(), 1);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn removal_does_not_move_other_elements() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        let handles: Vec<Handle> = (0..5u32)
            .map(|i| {
                let (h, v) = store.insert(&mut arena).unwrap();
                *v = i * 10;
                h
            })
            .collect();
        store.remove(handles[2].locator()).unwrap();
        for (i, h) in handles.iter().enumerate() {
            if i != 2 {
                assert_eq!(*store.get_live(&arena, *h).unwrap(), i as u32 * 10);
            }
        }
    }

    #[test]
    fn iter_visits_live_slots_in_order() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        for i in 0..(PAGE_SIZE as u32 + 3) {
            let (_, v) = store.insert(&mut arena).unwrap();
            *v = i;
        }
        store.remove(Locator::new(0, 0)).unwrap();
        store.remove(Locator::new(1, 1)).unwrap();

        let seen: Vec<(Locator, u32)> = store
            .iter(&arena)
            .unwrap()
            .map(|(loc, v)| (loc, *v))
            .collect();
        assert_eq!(seen.len(), store.len());
        assert_eq!(seen[0], (Locator::new(0, 1), 1));
        assert_eq!(seen.last().copied(), Some((Locator::new(1, 2), 66)));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn for_each_live_mut_updates_in_place() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        for _ in 0..4 {
            store.insert(&mut arena).unwrap();
        }
        store.remove(Locator::new(0, 3)).unwrap();
        store
            .for_each_live_mut(&mut arena, |loc, v| *v = loc.slot + 100)
            .unwrap();
        let values: Vec<u32> = store.iter(&arena).unwrap().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![100, 101, 102]);
    }

    #[test]
    fn arena_reset_is_reported_not_aliased() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        let (h, _) = store.insert(&mut arena).unwrap();
        arena.reset();
        assert!(matches!(
            store.get(&arena, h.locator()),
            Err(SlotError::Arena(ArenaError::StaleAllocation { .. }))
        ));
        assert!(store.iter(&arena).is_err());
    }

    #[test]
    fn handle_of_tracks_liveness() {
        let mut arena = arena();
        let mut store = SlotStore::<u32>::new();
        let (h, _) = store.insert(&mut arena).unwrap();
        assert_eq!(store.handle_of(h.locator()), Some(h));
        assert!(store.is_live(h.locator()));
        store.remove(h.locator()).unwrap();
        assert_eq!(store.handle_of(h.locator()), None);
        assert!(!store.is_live(h.locator()));
        assert!(!store.is_live(Locator::new(9, 0)));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn live_count_and_uniqueness(
                ops in proptest::collection::vec(any::<(bool, u8)>(), 1..300),
            ) {
                let mut arena = Arena::new(1 << 20);
                let mut store = SlotStore::<u64>::new();
                let mut live: Vec<Handle> = Vec::new();
                let mut inserts = 0usize;
                let mut removes = 0usize;

                for (insert, pick) in ops {
                    if insert || live.is_empty() {
                        let (h, v) = store.insert(&mut arena).unwrap();
                        *v = h.to_bits();
                        live.push(h);
                        inserts += 1;
                    } else {
                        let h = live.swap_remove(pick as usize % live.len());
                        store.remove(h.locator()).unwrap();
                        removes += 1;
                    }
                }

                prop_assert_eq!(store.len(), inserts - removes);
                let locators: HashSet<Locator> = live.iter().map(|h| h.locator()).collect();
                prop_assert_eq!(locators.len(), live.len());
                for h in &live {
                    prop_assert_eq!(*store.get_live(&arena, *h).unwrap(), h.to_bits());
                }
                prop_assert_eq!(store.iter(&arena).unwrap().count(), live.len());
            }

            #[test]
            fn free_slots_reused_before_growth(n in 1usize..PAGE_SIZE, k in 1usize..PAGE_SIZE) {
                let mut arena = Arena::new(1 << 16);
                let mut store = SlotStore::<u32>::new();
                let handles: Vec<Handle> = (0..n).map(|_| store.insert(&mut arena).unwrap().0).collect();
                for h in handles.iter().take(k.min(n)) {
                    store.remove(h.locator()).unwrap();
                }
                for _ in 0..k.min(n) {
                    store.insert(&mut arena).unwrap();
                }
                prop_assert_eq!(store.page_count(), 1);
            }
        }
    }
}
