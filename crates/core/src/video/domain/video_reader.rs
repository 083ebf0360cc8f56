use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Decodes a clip into RGB frames.
///
/// The pipeline only sees `Frame` and `VideoMetadata`; codec and container
/// handling stay behind this trait.
pub trait VideoReader: Send {
    /// Opens the clip and probes its stream parameters.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in presentation order, indexed from 0.
    ///
    /// Iteration is lazy so that memory stays bounded by the pipeline's
    /// in-flight frames rather than the clip length.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
