use crate::shared::error::WatermarkError;
use crate::template::domain::template::Template;

/// Supplies the watermark template once, before any frame is processed.
pub trait TemplateSource {
    fn load(&self) -> Result<Template, WatermarkError>;
}
