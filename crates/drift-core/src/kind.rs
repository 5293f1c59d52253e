//! The central renderable-type tag table.

use std::fmt;

/// Which shared renderable an entity is drawn with.
///
/// Tags are assigned here and nowhere else. Tag `0` is reserved for
/// "no renderable" so that a zeroed entity record carries no tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum RenderableKind {
    /// The player ship.
    Ship = 1,
    /// An asteroid of any size.
    Asteroid = 2,
    /// A laser shot.
    Laser = 3,
}

impl RenderableKind {
    /// Every kind, in tag order.
    pub const ALL: [RenderableKind; 3] = [Self::Ship, Self::Asteroid, Self::Laser];

    /// Number of distinct kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// The raw tag stored in entity records.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Look up a kind by its raw tag. Returns `None` for `0` and unknown tags.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Ship),
            2 => Some(Self::Asteroid),
            3 => Some(Self::Laser),
            _ => None,
        }
    }

    /// Dense index in `0..COUNT`, for per-kind tables.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for RenderableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ship => "ship",
            Self::Asteroid => "asteroid",
            Self::Laser => "laser",
        };
        f.write_str(name)
    }
}
