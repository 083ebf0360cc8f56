use ndarray::Array2;

use crate::shared::gray_frame::GrayFrame;

/// Grayscale reference image of the watermark logo.
///
/// Immutable once built. Statistics the localizer needs on every call are
/// computed up front.
#[derive(Clone, Debug)]
pub struct Template {
    pixels: GrayFrame,
    mean: f64,
    /// Sum of squared deviations from the mean.
    energy: f64,
}

impl Template {
    pub fn new(pixels: GrayFrame) -> Self {
        let n = pixels.data().len().max(1) as f64;
        let mean = pixels.data().iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let energy = pixels
            .data()
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum();
        Self {
            pixels,
            mean,
            energy,
        }
    }

    pub fn pixels(&self) -> &GrayFrame {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Template values minus their mean, row-major.
    pub fn zero_mean(&self) -> Vec<f64> {
        self.pixels
            .data()
            .iter()
            .map(|&v| f64::from(v) - self.mean)
            .collect()
    }

    /// [`Template::zero_mean`] shaped `(height, width)`.
    pub fn zero_mean_array(&self) -> Array2<f64> {
        self.pixels.as_ndarray().mapv(|v| f64::from(v) - self.mean)
    }
}
