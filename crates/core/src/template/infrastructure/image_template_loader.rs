use std::path::{Path, PathBuf};

use crate::shared::error::WatermarkError;
use crate::shared::gray_frame::GrayFrame;
use crate::template::domain::template::Template;
use crate::template::domain::template_source::TemplateSource;

/// Loads the watermark template from a still image using the `image` crate.
///
/// Any format the crate decodes (PGM, PNG, ...) is accepted; color images are
/// reduced to 8-bit luma.
pub struct ImageTemplateLoader {
    path: PathBuf,
}

impl ImageTemplateLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl Into<String>) -> WatermarkError {
        WatermarkError::TemplateLoad {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl TemplateSource for ImageTemplateLoader {
    fn load(&self) -> Result<Template, WatermarkError> {
        if !self.path.is_file() {
            return Err(self.error("file not found"));
        }

        let img = image::open(&self.path).map_err(|e| self.error(e.to_string()))?;
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return Err(self.error("template image is empty"));
        }

        log::debug!(
            "Loaded watermark template {}x{} from {}",
            width,
            height,
            self.path.display()
        );
        Ok(Template::new(GrayFrame::new(luma.into_raw(), width, height)))
    }
}
