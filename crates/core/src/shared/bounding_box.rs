/// Watermark location in frame coordinates.
///
/// Width and height always equal the template's dimensions since matching is
/// same-scale only. `confidence` is the normalized correlation score in
/// `[0, 1]` recorded when the box was localized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.right() <= frame_width && self.bottom() <= frame_height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Same rectangle, ignoring confidence.
    pub fn same_region(&self, other: &BoundingBox) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
    }
}
