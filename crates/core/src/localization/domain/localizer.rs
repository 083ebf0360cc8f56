use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::template::domain::template::Template;

/// Domain interface for finding the template inside a frame.
///
/// Implementations are pure: the same frame and template always produce the
/// same box. The returned box carries the match confidence in `[0, 1]`.
pub trait Localizer: Send {
    fn locate(&self, frame: &Frame, template: &Template) -> Result<BoundingBox, WatermarkError>;
}
