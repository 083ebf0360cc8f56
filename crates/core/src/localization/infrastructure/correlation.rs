//! Normalization and peak selection shared by the correlation localizers.
//!
//! Both localizers compute the raw numerator `Σ T'(x,y)·I(x+u,y+v)` over every
//! valid offset (with `T'` the zero-mean template) and hand it here to be
//! divided by the window and template energies.

use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::gray_frame::GrayFrame;
use crate::template::domain::template::Template;

/// Below this product of energies a window is treated as flat and scores 0.
const FLAT_EPSILON: f64 = 1e-6;

/// Fails unless the template fits inside the frame at least once.
pub fn check_dimensions(gray: &GrayFrame, template: &Template) -> Result<(), WatermarkError> {
    if gray.width() < template.width() || gray.height() < template.height() {
        return Err(WatermarkError::InvalidFrameDimensions {
            frame_width: gray.width(),
            frame_height: gray.height(),
            template_width: template.width(),
            template_height: template.height(),
        });
    }
    Ok(())
}

/// Number of valid offsets along each axis.
pub fn offset_grid(gray: &GrayFrame, template: &Template) -> (usize, usize) {
    (
        (gray.width() - template.width()) as usize + 1,
        (gray.height() - template.height()) as usize + 1,
    )
}

/// Summed-area tables of pixel values and squared values.
///
/// Tables are `(width + 1) x (height + 1)` with a zero first row and column.
/// All sums of 8-bit values stay exact in f64.
pub struct IntegralImage {
    sum: Vec<f64>,
    sq_sum: Vec<f64>,
    stride: usize,
}

impl IntegralImage {
    pub fn new(gray: &GrayFrame) -> Self {
        let w = gray.width() as usize;
        let h = gray.height() as usize;
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sq_sum = vec![0.0; stride * (h + 1)];

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = f64::from(gray.get(x, y));
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            sum,
            sq_sum,
            stride,
        }
    }

    /// Returns `(Σ v, Σ v²)` over the `w x h` window at `(x, y)`.
    pub fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let a = y * s + x;
        let b = y * s + x + w;
        let c = (y + h) * s + x;
        let d = (y + h) * s + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sq_sum[d] - self.sq_sum[b] - self.sq_sum[c] + self.sq_sum[a],
        )
    }
}

/// Normalizes raw numerators and returns the best-scoring box.
///
/// `numerators` is row-major over the offset grid. Scanning is row-major with
/// a strict comparison, so ties resolve to the top-left-most offset.
pub fn select_best(gray: &GrayFrame, template: &Template, numerators: &[f64]) -> BoundingBox {
    let (out_w, out_h) = offset_grid(gray, template);
    debug_assert_eq!(numerators.len(), out_w * out_h);

    let tw = template.width() as usize;
    let th = template.height() as usize;
    let n = (tw * th) as f64;
    let integral = IntegralImage::new(gray);

    let mut best_score = f64::NEG_INFINITY;
    let mut best = (0usize, 0usize);

    for v in 0..out_h {
        for u in 0..out_w {
            let (sum, sq_sum) = integral.window(u, v, tw, th);
            let window_energy = (sq_sum - sum * sum / n).max(0.0);
            let denom = window_energy * template.energy();
            let score = if denom <= FLAT_EPSILON {
                0.0
            } else {
                numerators[v * out_w + u] / denom.sqrt()
            };
            if score > best_score {
                best_score = score;
                best = (u, v);
            }
        }
    }

    BoundingBox::new(
        best.0 as u32,
        best.1 as u32,
        template.width(),
        template.height(),
        best_score.clamp(0.0, 1.0),
    )
}
