use crate::IVec2;

/// Integer pixel rectangle, `min` inclusive and `min + size` exclusive.
///
/// Describes padded block footprints in image space and the overlap that
/// is added when one block is merged into another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rect2i {
    pub min: IVec2,
    pub size: IVec2,
}

impl Rect2i {
    /// Create a rectangle from its top-left corner and size.
    pub fn new(min: IVec2, size: IVec2) -> Self {
        Self { min, size }
    }

    /// Create a rectangle from two corners (`max` exclusive).
    pub fn from_corners(min: IVec2, max: IVec2) -> Self {
        Self {
            min,
            size: max - min,
        }
    }

    /// Exclusive bottom-right corner.
    pub fn max(&self) -> IVec2 {
        self.min + self.size
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// Overlap of two rectangles. The result may be empty.
    pub fn intersect(&self, other: &Rect2i) -> Rect2i {
        let min = self.min.max(other.min);
        let max = self.max().min(other.max());
        Rect2i::from_corners(min, max)
    }

    /// Grow the rectangle by `border` pixels on every side.
    pub fn expand(&self, border: i32) -> Rect2i {
        Rect2i::new(self.min - border, self.size + 2 * border)
    }
}
