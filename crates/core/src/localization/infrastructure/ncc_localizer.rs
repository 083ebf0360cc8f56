use ndarray::Zip;

use crate::localization::domain::localizer::Localizer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::template::domain::template::Template;

use super::correlation;

/// Zero-mean normalized cross-correlation computed directly in the spatial
/// domain.
///
/// Cost is proportional to frame area times template area. Window energies
/// come from integral images so only the numerator is computed per offset.
pub struct NccLocalizer;

impl NccLocalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NccLocalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer for NccLocalizer {
    fn locate(&self, frame: &Frame, template: &Template) -> Result<BoundingBox, WatermarkError> {
        let gray = frame.to_gray();
        correlation::check_dimensions(&gray, template)?;

        let pixels = gray.as_ndarray().mapv(f64::from);
        let tpl = template.zero_mean_array();
        let window = (template.height() as usize, template.width() as usize);

        // Windows come out row-major, matching the offset grid.
        let numerators: Vec<f64> = pixels
            .windows(window)
            .into_iter()
            .map(|w| Zip::from(&w).and(&tpl).fold(0.0, |acc, &a, &b| acc + a * b))
            .collect();

        Ok(correlation::select_best(&gray, template, &numerators))
    }
}
