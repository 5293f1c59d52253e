//! Locators, identifiers and generation-checked handles.
//!
//! A [`Locator`] addresses one slot of a paged slot store. The numeric
//! [`EntityId`] is derived from it as `page * PAGE_SIZE + slot`, and
//! [`decode`] inverts that mapping. Both directions read the single
//! [`PAGE_SIZE`] constant below, so encode and decode sites cannot drift
//! apart.
//!
//! Identifiers are recycled together with their slots. A [`Handle`]
//! pairs the locator with the slot's generation so that a lookup through
//! an old handle can be rejected after the slot has been reused.

use std::fmt;

/// Number of slots in every slot-store page.
///
/// This is the only definition in the workspace. Changing it reinterprets
/// every previously encoded [`EntityId`] and every [`Handle`] bit pattern,
/// so identifiers must never outlive a build with a different value.
pub const PAGE_SIZE: usize = 64;

/// Upper bound on the number of pages a slot store may hold.
///
/// Keeps `page * PAGE_SIZE + slot` within `u32`, which is what
/// [`Handle::to_bits`] packs into its upper half.
pub const MAX_PAGES: u32 = ((1u64 << 32) / PAGE_SIZE as u64) as u32;

/// Numeric identifier of a simulation object.
///
/// Unique only among objects that are alive at the same time.
pub type EntityId = u64;

/// Identifier value that never names a live object.
pub const INVALID_ENTITY_ID: EntityId = u64::MAX;

/// Position of one slot inside a paged slot store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    /// Index of the page within the store.
    pub page: u32,
    /// Index of the slot within the page, `< PAGE_SIZE`.
    pub slot: u32,
}

impl Locator {
    /// Create a locator from a page and slot index.
    pub const fn new(page: u32, slot: u32) -> Self {
        Self { page, slot }
    }

    /// Flat slot index across all pages.
    pub fn index(&self) -> usize {
        self.page as usize * PAGE_SIZE + self.slot as usize
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.slot)
    }
}

/// Encode a locator as `page * PAGE_SIZE + slot`.
pub fn encode(locator: Locator) -> EntityId {
    u64::from(locator.page) * PAGE_SIZE as u64 + u64::from(locator.slot)
}

/// Decode an identifier back into the locator it was encoded from.
///
/// Identifiers whose page does not fit in `u32` decode to page
/// `u32::MAX`, which no store can hold, so lookups report them as
/// out of range instead of aliasing a real slot.
pub fn decode(id: EntityId) -> Locator {
    let page = u32::try_from(id / PAGE_SIZE as u64).unwrap_or(u32::MAX);
    let slot = (id % PAGE_SIZE as u64) as u32;
    Locator { page, slot }
}

/// A locator paired with the generation of the slot it was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Handle {
    locator: Locator,
    generation: u32,
}

impl Handle {
    /// Create a handle.
    pub const fn new(locator: Locator, generation: u32) -> Self {
        Self {
            locator,
            generation,
        }
    }

    /// The slot this handle refers to.
    pub fn locator(&self) -> Locator {
        self.locator
    }

    /// The slot generation at the time the handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The plain (generation-less) identifier of the slot.
    pub fn id(&self) -> EntityId {
        encode(self.locator)
    }

    /// Pack into `id * 2^32 + generation`.
    pub fn to_bits(&self) -> u64 {
        (self.id() << 32) | u64::from(self.generation)
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u64) -> Self {
        Self {
            locator: decode(bits >> 32),
            generation: bits as u32,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}, gen={})", self.locator, self.generation)
    }
}
