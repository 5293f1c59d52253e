//! Fixed-capacity bump arena.
//!
//! An [`Arena`] owns one contiguous, zero-initialised byte buffer and a
//! cursor that only moves forward between resets. There is no
//! per-allocation free: memory comes back in bulk via [`Arena::reset`]
//! (start of a new generation) or [`Arena::reset_to`] (rewind to a
//! [`Mark`]).
//!
//! # Staleness tracking
//!
//! Every allocation records the arena generation and rewind epoch it was
//! issued in. The floor of an epoch is the lowest offset rewound to since
//! that epoch began. An allocation is live iff its generation is current
//! and its end does not exceed the floor of its epoch.
//!
//! Floors are non-decreasing in epoch, so the arena stores them as runs of
//! epochs sharing one floor. A rewind to `to` merges every trailing run
//! with a floor `>= to` into one, which keeps the run floors strictly
//! increasing. Repeated rewinds to the same point therefore leave the
//! table at a fixed length, and nested scopes cost one run per level.

use bytemuck::{Pod, Zeroable};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace, warn};

use crate::allocation::{Allocation, ArenaId, Mark, TypedAllocation};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw::Block;

/// A bump-pointer memory region with bulk reset.
///
/// Not thread-safe in the logical sense: allocation and reset take
/// `&mut self`, and the design assumes one owner per frame phase.
pub struct Arena {
    id: ArenaId,
    label: &'static str,
    /// Backing storage. Allocated to full capacity at creation.
    storage: Vec<Block>,
    /// Usable capacity in bytes (may be less than `storage` rounds up to).
    capacity: usize,
    /// Bump pointer in bytes.
    offset: usize,
    /// Largest `offset` seen since creation.
    high_water: usize,
    generation: u32,
    epoch: u64,
    /// Runs of epochs sharing a floor, oldest first. Never empty; the last
    /// run holds the current epoch with an unbounded floor.
    floors: SmallVec<[FloorRun; 8]>,
}

/// Epochs `since..` (up to the next run) share the rewind floor `floor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FloorRun {
    since: u64,
    floor: usize,
}

impl FloorRun {
    const OPEN: FloorRun = FloorRun {
        since: 0,
        floor: usize::MAX,
    };
}

impl Arena {
    /// Largest supported alignment in bytes.
    pub const MAX_ALIGN: usize = std::mem::align_of::<Block>();

    /// Largest supported capacity in bytes.
    pub const MAX_CAPACITY: usize = isize::MAX as usize - Self::MAX_ALIGN;

    /// Create an arena with the given capacity in bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_label("arena", capacity)
    }

    /// Create a labelled arena. The label appears in logs and errors.
    pub fn with_label(label: &'static str, capacity: usize) -> Self {
        let blocks = capacity.div_ceil(Self::MAX_ALIGN);
        debug!(label, capacity, "creating arena");
        Self {
            id: ArenaId::next(),
            label,
            storage: vec![Block::zeroed(); blocks],
            capacity,
            offset: 0,
            high_water: 0,
            generation: 0,
            epoch: 0,
            floors: smallvec![FloorRun::OPEN],
        }
    }

    /// Create an arena from a validated config.
    pub fn from_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::with_label(config.label, config.capacity))
    }

    /// Reserve `size` bytes aligned to `align`.
    ///
    /// The returned range is zero-filled. On failure nothing changes.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, ArenaError> {
        if align == 0 || !align.is_power_of_two() || align > Self::MAX_ALIGN {
            return Err(ArenaError::InvalidAlignment {
                align,
                max: Self::MAX_ALIGN,
            });
        }
        let mask = align - 1;
        let end = self
            .offset
            .checked_add(mask)
            .map(|v| v & !mask)
            .and_then(|start| start.checked_add(size).map(|end| (start, end)));
        let (start, end) = match end {
            Some((start, end)) if end <= self.capacity => (start, end),
            _ => {
                warn!(
                    label = self.label,
                    requested = size,
                    used = self.offset,
                    capacity = self.capacity,
                    "arena exhausted"
                );
                return Err(ArenaError::OutOfMemory {
                    label: self.label,
                    requested: size,
                    used: self.offset,
                    capacity: self.capacity,
                });
            }
        };

        self.raw_bytes_mut()[start..end].fill(0);
        self.offset = end;
        self.high_water = self.high_water.max(end);
        Ok(Allocation {
            offset: start,
            len: size,
            arena: self.id,
            generation: self.generation,
            epoch: self.epoch,
        })
    }

    /// Reserve one zeroed `T`.
    pub fn allocate_typed<T: Pod>(&mut self) -> Result<TypedAllocation<T>, ArenaError> {
        self.allocate_array(1)
    }

    /// Reserve `count` zeroed, contiguous `T`s.
    pub fn allocate_array<T: Pod>(
        &mut self,
        count: usize,
    ) -> Result<TypedAllocation<T>, ArenaError> {
        let size = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ArenaError::OutOfMemory {
                label: self.label,
                requested: usize::MAX,
                used: self.offset,
                capacity: self.capacity,
            })?;
        let raw = self.allocate(size, std::mem::align_of::<T>())?;
        Ok(TypedAllocation::new(raw, count))
    }

    /// Capture the current offset for a later [`reset_to`](Self::reset_to).
    pub fn mark(&self) -> Mark {
        Mark {
            arena: self.id,
            offset: self.offset,
            generation: self.generation,
            epoch: self.epoch,
        }
    }

    /// Rewind to `mark`, reclaiming everything allocated after it.
    ///
    /// Allocations made before the mark stay valid. Fails with
    /// [`ArenaError::InvalidMark`] if the mark predates the last full
    /// reset or an earlier rewind already went below it.
    pub fn reset_to(&mut self, mark: Mark) -> Result<(), ArenaError> {
        if mark.arena != self.id {
            return Err(ArenaError::ForeignAllocation);
        }
        let floor = self.floor(mark.epoch);
        if mark.generation != self.generation || mark.offset > floor || mark.offset > self.offset
        {
            return Err(ArenaError::InvalidMark {
                offset: mark.offset,
            });
        }
        self.rewind(mark.offset);
        Ok(())
    }

    /// Reclaim everything and start a new generation.
    pub fn reset(&mut self) {
        trace!(
            label = self.label,
            used = self.offset,
            generation = self.generation,
            "arena reset"
        );
        self.offset = 0;
        self.generation = self.generation.wrapping_add(1);
        self.epoch = 0;
        self.floors.clear();
        self.floors.push(FloorRun::OPEN);
    }

    /// Verify that `alloc` was issued by this arena and is still live.
    pub fn check(&self, alloc: &Allocation) -> Result<(), ArenaError> {
        if alloc.arena != self.id {
            return Err(ArenaError::ForeignAllocation);
        }
        if alloc.generation != self.generation || alloc.end() > self.floor(alloc.epoch) {
            return Err(ArenaError::StaleAllocation {
                offset: alloc.offset,
                len: alloc.len,
            });
        }
        Ok(())
    }

    /// Whether `alloc` is live in this arena.
    pub fn is_live(&self, alloc: &Allocation) -> bool {
        self.check(alloc).is_ok()
    }

    /// The bytes of a live allocation.
    pub fn bytes(&self, alloc: &Allocation) -> Result<&[u8], ArenaError> {
        self.check(alloc)?;
        Ok(&self.raw_bytes()[alloc.range()])
    }

    /// The bytes of a live allocation, mutably.
    pub fn bytes_mut(&mut self, alloc: &Allocation) -> Result<&mut [u8], ArenaError> {
        self.check(alloc)?;
        Ok(&mut self.raw_bytes_mut()[alloc.range()])
    }

    /// View a live typed allocation as a slice.
    pub fn slice<T: Pod>(&self, alloc: &TypedAllocation<T>) -> Result<&[T], ArenaError> {
        let bytes = self.bytes(&alloc.raw)?;
        bytemuck::try_cast_slice(bytes).map_err(|_| bad_cast::<T>(&alloc.raw))
    }

    /// View a live typed allocation as a mutable slice.
    pub fn slice_mut<T: Pod>(
        &mut self,
        alloc: &TypedAllocation<T>,
    ) -> Result<&mut [T], ArenaError> {
        let raw = alloc.raw;
        let bytes = self.bytes_mut(&raw)?;
        bytemuck::try_cast_slice_mut(bytes).map_err(|_| bad_cast::<T>(&raw))
    }

    /// The first value of a live typed allocation.
    pub fn get<T: Pod>(&self, alloc: &TypedAllocation<T>) -> Result<&T, ArenaError> {
        self.slice(alloc)?
            .first()
            .ok_or_else(|| bad_cast::<T>(&alloc.raw))
    }

    /// The first value of a live typed allocation, mutably.
    pub fn get_mut<T: Pod>(&mut self, alloc: &TypedAllocation<T>) -> Result<&mut T, ArenaError> {
        let raw = alloc.raw;
        self.slice_mut(alloc)?
            .first_mut()
            .ok_or_else(|| bad_cast::<T>(&raw))
    }

    /// This arena's unique id.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Label given at construction.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Bytes currently allocated (the bump offset).
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes left before the next allocation would fail (ignoring padding).
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset
    }

    /// Highest offset ever reached. Useful for sizing arenas.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Number of full resets performed (wrapping).
    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn floor(&self, epoch: u64) -> usize {
        // An epoch from the future belongs to no live state of this arena.
        if epoch > self.epoch {
            return 0;
        }
        let run = self.floors.partition_point(|r| r.since <= epoch);
        run.checked_sub(1)
            .and_then(|i| self.floors.get(i))
            .map_or(0, |r| r.floor)
    }

    fn rewind(&mut self, to: usize) {
        let mut since = self.epoch;
        while let Some(last) = self.floors.last() {
            if last.floor < to {
                break;
            }
            since = last.since;
            self.floors.pop();
        }
        self.floors.push(FloorRun { since, floor: to });
        trace!(
            label = self.label,
            from = self.offset,
            to,
            epoch = self.epoch,
            "arena rewind"
        );
        self.offset = to;
        self.epoch = self.epoch.wrapping_add(1);
        self.floors.push(FloorRun {
            since: self.epoch,
            floor: usize::MAX,
        });
    }

    fn raw_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.storage)
    }

    fn raw_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.storage)
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("used", &self.offset)
            .field("capacity", &self.capacity)
            .field("generation", &self.generation)
            .field("epoch", &self.epoch)
            .finish()
    }
}

fn bad_cast<T>(alloc: &Allocation) -> ArenaError {
    ArenaError::BadCast {
        offset: alloc.offset,
        len: alloc.len,
        type_name: std::any::type_name::<T>(),
    }
}
