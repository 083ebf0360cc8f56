use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Encodes cleaned frames into the output container.
pub trait VideoWriter: Send {
    /// Creates the output with the source's dimensions and frame rate.
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes the encoder and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
