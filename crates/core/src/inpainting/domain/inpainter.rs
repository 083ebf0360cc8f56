use crate::masking::domain::mask::Mask;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;

/// Domain interface for reconstructing masked pixels from their surroundings.
///
/// Implementations return a new frame with the same dimensions, channel count
/// and index. Pixels outside the mask must be copied bit-for-bit.
pub trait Inpainter: Send {
    fn inpaint(&self, frame: &Frame, mask: &Mask) -> Result<Frame, WatermarkError>;
}
