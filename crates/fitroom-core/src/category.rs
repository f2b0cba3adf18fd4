//! Worker categories.

use std::fmt;

/// The mutually exclusive class a worker belongs to.
///
/// Workers of different categories never share the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Blue workers.
    Blue,
    /// Green workers.
    Green,
}

impl Category {
    /// Both categories, in index order.
    pub const ALL: [Self; 2] = [Self::Blue, Self::Green];

    /// The other category.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Blue => Self::Green,
            Self::Green => Self::Blue,
        }
    }

    /// Stable index for per-category arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Green => 1,
        }
    }

    /// Human-readable name, as shown in room transcripts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Green => "Green",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
