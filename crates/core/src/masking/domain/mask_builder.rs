use crate::shared::bounding_box::BoundingBox;

use super::mask::{Mask, MASK_OFF, MASK_ON};

/// Turns a watermark box into an occlusion mask.
///
/// Template matching finds the logo's opaque core, but anti-aliased edge
/// pixels extend past it. The filled box is therefore dilated with a square
/// `(2r + 1) x (2r + 1)` structuring element and clipped to the frame.
#[derive(Clone, Copy, Debug)]
pub struct MaskBuilder {
    dilation_radius: u32,
}

impl MaskBuilder {
    pub fn new(dilation_radius: u32) -> Self {
        Self { dilation_radius }
    }

    pub fn build(&self, bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> Mask {
        let mut mask = Mask::empty(frame_width, frame_height);
        let x_end = bbox.right().min(frame_width);
        let y_end = bbox.bottom().min(frame_height);
        for y in bbox.y..y_end {
            for x in bbox.x..x_end {
                mask.set(x, y);
            }
        }
        dilate(&mut mask, self.dilation_radius);
        mask
    }
}

/// Binary dilation with a square kernel, done as two separable passes.
///
/// Each pass keeps a sliding count of set pixels in the window, so the cost
/// is independent of the radius.
pub fn dilate(mask: &mut Mask, radius: u32) {
    if radius == 0 {
        return;
    }
    let w = mask.width() as usize;
    let h = mask.height() as usize;
    let r = radius as usize;
    let data = mask.data_mut();

    let mut line = Vec::with_capacity(w.max(h));

    for y in 0..h {
        line.clear();
        line.extend_from_slice(&data[y * w..(y + 1) * w]);
        dilate_line(&line, r, |x, on| data[y * w + x] = on);
    }

    for x in 0..w {
        line.clear();
        line.extend((0..h).map(|y| data[y * w + x]));
        dilate_line(&line, r, |y, on| data[y * w + x] = on);
    }
}

fn dilate_line(src: &[u8], r: usize, mut write: impl FnMut(usize, u8)) {
    let n = src.len();
    let is_on = |i: usize| usize::from(src[i] != MASK_OFF);

    // Count of set pixels in [i - r, i + r], clipped to the line.
    let mut count: usize = (0..=r.min(n.saturating_sub(1))).map(is_on).sum();
    for i in 0..n {
        write(i, if count > 0 { MASK_ON } else { MASK_OFF });
        if i + r + 1 < n {
            count += is_on(i + r + 1);
        }
        if i >= r {
            count -= is_on(i - r);
        }
    }
}
