use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::shared::error::WatermarkError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_cleaner::FrameCleaner;
use super::pipeline_logger::PipelineLogger;

pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Cooperative cancellation for one run.
///
/// The callback receives `(frames_written, total_frames)`; returning `false`
/// stops the run. `total_frames` is 0 when the container does not know.
pub struct ExecutionOptions {
    pub on_progress: Option<ProgressCallback>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ExecutionOptions {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Runs the progress callback; a `false` answer raises the cancel flag.
    pub fn report_progress(&self, current: usize, total: usize) -> Result<(), WatermarkError> {
        if let Some(callback) = &self.on_progress {
            if !callback(current, total) {
                self.cancelled.store(true, Ordering::Relaxed);
            }
        }
        if self.is_cancelled() {
            return Err(WatermarkError::Cancelled);
        }
        Ok(())
    }
}

/// Runs decode → clean → encode over a whole clip.
///
/// `reader` arrives already opened; the executor opens `writer`. Both are
/// closed before `execute` returns, whatever the outcome. Returns the number
/// of frames written.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        cleaner: &mut FrameCleaner,
        metadata: &VideoMetadata,
        output_path: &Path,
        options: &ExecutionOptions,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, WatermarkError>;
}
