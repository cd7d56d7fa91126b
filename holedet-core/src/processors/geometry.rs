//! Axis-aligned boxes in pixel or normalized space.

use serde::{Deserialize, Serialize};

/// An axis-aligned box `(x1, y1, x2, y2)` with integer corners.
///
/// The same type carries pixel boxes and boxes on the normalized 0-1000 grid;
/// which space a value lives in is decided by the caller's
/// [`CoordMode`](super::CoordMode). Serialized as a plain `[x1, y1, x2, y2]`
/// array, which is the shape the model emits and consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    #[inline]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Returns true when `x1 < x2` and `y1 < y2`.
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Reorders the corners so that the minimum comes first on both axes.
    pub fn sorted(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Returns true when `other` lies inside this box, edges included.
    pub fn contains(&self, other: &BBox) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// Expresses this box relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &BBox) -> Self {
        Self {
            x1: self.x1 - origin.x1,
            y1: self.y1 - origin.y1,
            x2: self.x2 - origin.x1,
            y2: self.y2 - origin.y1,
        }
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<[i32; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        b.to_array()
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}
