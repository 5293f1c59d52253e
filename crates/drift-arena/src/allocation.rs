//! Allocation descriptors returned by [`Arena`](crate::Arena).
//!
//! An [`Allocation`] records where a block lives and which arena state
//! issued it. It is a plain value, never a pointer: resolving it back to
//! bytes always goes through the arena, which rejects descriptors whose
//! range has been reclaimed since they were issued.
//!
//! Descriptors are themselves plain-old-data so they can be stored inside
//! arena memory, e.g. as links between nodes of an intrusive list. A
//! descriptor read back from bytes is still checked on every access.

// `derive(Pod)` expands to `unsafe impl`s.
#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Unique per-instance identifier of an arena. Zero is never issued.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ArenaId(u32);

impl ArenaId {
    pub(crate) fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A byte range issued by an arena.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[must_use]
pub struct Allocation {
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) arena: ArenaId,
    /// Arena generation (full-reset count) at allocation time.
    pub(crate) generation: u32,
    /// Rewind epoch within the generation at allocation time.
    pub(crate) epoch: u64,
}

impl Allocation {
    /// The all-zero descriptor. No arena issues it, so it never resolves.
    pub const NULL: Allocation = Allocation {
        offset: 0,
        len: 0,
        arena: ArenaId(0),
        generation: 0,
        epoch: 0,
    };

    /// Whether this is [`Allocation::NULL`].
    pub fn is_null(&self) -> bool {
        self.arena.0 == 0
    }

    /// Byte offset from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        // Saturates so that descriptors read back from bytes cannot overflow.
        self.offset.saturating_add(self.len)
    }

    /// The byte range within the arena.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Arena generation this allocation belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Rewind epoch this allocation was made in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The arena that issued this allocation.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Allocation(arena={}, off={}, len={}, gen={}, epoch={})",
            self.arena, self.offset, self.len, self.generation, self.epoch
        )
    }
}

/// An allocation sized and aligned for `count` values of `T`.
#[must_use]
pub struct TypedAllocation<T> {
    pub(crate) raw: Allocation,
    pub(crate) count: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedAllocation<T> {
    pub(crate) fn new(raw: Allocation, count: usize) -> Self {
        Self {
            raw,
            count,
            _marker: PhantomData,
        }
    }

    /// The untyped byte allocation.
    pub fn raw(&self) -> Allocation {
        self.raw
    }

    /// Number of `T` values.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether this holds zero values.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T> Clone for TypedAllocation<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedAllocation<T> {}

impl<T> PartialEq for TypedAllocation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.count == other.count
    }
}

impl<T> Eq for TypedAllocation<T> {}

impl<T> fmt::Debug for TypedAllocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocation")
            .field("type", &std::any::type_name::<T>())
            .field("count", &self.count)
            .field("raw", &self.raw)
            .finish()
    }
}

/// A saved arena offset for scoped rewinding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Mark {
    pub(crate) arena: ArenaId,
    pub(crate) offset: usize,
    pub(crate) generation: u32,
    pub(crate) epoch: u64,
}

impl Mark {
    /// The saved offset in bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(offset: usize, len: usize) -> Allocation {
        Allocation {
            offset,
            len,
            arena: ArenaId(7),
            ..Allocation::NULL
        }
    }

    #[test]
    fn range_covers_offset_to_end() {
        let a = alloc(16, 32);
        assert_eq!(a.end(), 48);
        assert_eq!(a.range(), 16..48);
        assert!(!a.is_empty());
    }

    #[test]
    fn null_is_zeroed_and_distinct() {
        assert!(Allocation::NULL.is_null());
        assert_eq!(Allocation::NULL, Allocation::zeroed());
        assert!(!alloc(0, 8).is_null());
    }

    #[test]
    fn descriptor_survives_byte_round_trip() {
        let a = alloc(48, 16);
        let back: Allocation = bytemuck::pod_read_unaligned(bytemuck::bytes_of(&a));
        assert_eq!(a, back);
    }

    #[test]
    fn descriptor_has_no_padding() {
        let expected = 2 * std::mem::size_of::<usize>() + 2 * 4 + 8;
        assert_eq!(std::mem::size_of::<Allocation>(), expected);
    }

    #[test]
    fn arena_ids_are_unique() {
        let a = ArenaId::next();
        let b = ArenaId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn typed_allocation_is_copy_for_any_t() {
        struct NotCopy;
        let t: TypedAllocation<NotCopy> = TypedAllocation::new(alloc(0, 0), 0);
        let u = t;
        assert_eq!(t, u);
        assert!(u.is_empty());
    }
}
