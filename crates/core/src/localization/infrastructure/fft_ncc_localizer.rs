use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::localization::domain::localizer::Localizer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::template::domain::template::Template;

use super::correlation;

/// Normalized cross-correlation with the numerator computed in the frequency
/// domain.
///
/// The transform size equals the frame size: for every valid offset the
/// template never wraps around, so circular correlation equals the spatial
/// one. Scores match [`NccLocalizer`](super::ncc_localizer::NccLocalizer) up
/// to floating-point rounding.
pub struct FftNccLocalizer;

impl FftNccLocalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FftNccLocalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer for FftNccLocalizer {
    fn locate(&self, frame: &Frame, template: &Template) -> Result<BoundingBox, WatermarkError> {
        let gray = frame.to_gray();
        correlation::check_dimensions(&gray, template)?;

        let w = gray.width() as usize;
        let h = gray.height() as usize;
        let tw = template.width() as usize;

        let mut image: Vec<Complex<f64>> = gray
            .data()
            .iter()
            .map(|&v| Complex::new(f64::from(v), 0.0))
            .collect();

        let mut kernel = vec![Complex::new(0.0, 0.0); w * h];
        for (i, value) in template.zero_mean().into_iter().enumerate() {
            kernel[(i / tw) * w + i % tw] = Complex::new(value, 0.0);
        }

        let mut planner = FftPlanner::<f64>::new();
        fft_2d(&mut planner, &mut image, w, h, false);
        fft_2d(&mut planner, &mut kernel, w, h, false);

        for (a, b) in image.iter_mut().zip(&kernel) {
            *a *= b.conj();
        }
        fft_2d(&mut planner, &mut image, w, h, true);

        // rustfft does not normalize the inverse transform
        let scale = 1.0 / (w * h) as f64;
        let (out_w, out_h) = correlation::offset_grid(&gray, template);
        let mut numerators = Vec::with_capacity(out_w * out_h);
        for v in 0..out_h {
            for u in 0..out_w {
                numerators.push(image[v * w + u].re * scale);
            }
        }

        Ok(correlation::select_best(&gray, template, &numerators))
    }
}

/// In-place 2-D transform of a row-major `width x height` buffer.
fn fft_2d(
    planner: &mut FftPlanner<f64>,
    buf: &mut [Complex<f64>],
    width: usize,
    height: usize,
    inverse: bool,
) {
    let (row_fft, col_fft) = if inverse {
        (planner.plan_fft_inverse(width), planner.plan_fft_inverse(height))
    } else {
        (planner.plan_fft_forward(width), planner.plan_fft_forward(height))
    };

    // Rows are contiguous, so one call processes all of them.
    row_fft.process(buf);

    let mut transposed = vec![Complex::new(0.0, 0.0); width * height];
    for y in 0..height {
        for x in 0..width {
            transposed[x * height + y] = buf[y * width + x];
        }
    }
    col_fft.process(&mut transposed);
    for x in 0..width {
        for y in 0..height {
            buf[y * width + x] = transposed[x * height + y];
        }
    }
}
