pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Binary occlusion mask with a frame's dimensions.
///
/// Nonzero (255) marks a pixel to reconstruct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            data: vec![MASK_OFF; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.data[self.offset(x, y)] != MASK_OFF
    }

    pub fn set(&mut self, x: u32, y: u32) {
        let idx = self.offset(x, y);
        self.data[idx] = MASK_ON;
    }

    /// Number of masked pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != MASK_OFF).count()
    }

    /// True when every pixel set in `other` is also set here.
    pub fn contains(&self, other: &Mask) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&mine, &theirs)| theirs == MASK_OFF || mine != MASK_OFF)
    }

    /// Tight `(x, y, width, height)` around the set pixels, if any.
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_set(x, y) {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        (min_x != u32::MAX).then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
