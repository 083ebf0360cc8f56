use std::path::Path;
use std::time::Instant;

use crate::pipeline::frame_cleaner::{elapsed_ms, FrameCleaner};
use crate::pipeline::pipeline_executor::{ExecutionOptions, PipelineExecutor};
use crate::pipeline::pipeline_logger::{PipelineLogger, STAGE_DECODE, STAGE_ENCODE};
use crate::shared::error::WatermarkError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// One frame at a time on the calling thread.
///
/// At most one decoded and one cleaned frame exist at any moment.
#[derive(Default)]
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        cleaner: &mut FrameCleaner,
        metadata: &VideoMetadata,
        output_path: &Path,
        options: &ExecutionOptions,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, WatermarkError> {
        if let Err(e) = writer.open(output_path, metadata) {
            reader.close();
            return Err(WatermarkError::encode(e));
        }

        let result = run_frames(
            &mut *reader,
            &mut *writer,
            cleaner,
            metadata.total_frames,
            options,
            logger,
        );

        reader.close();
        let closed = writer.close().map_err(WatermarkError::encode);

        let written = result?;
        closed?;
        Ok(written)
    }
}

fn run_frames(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    cleaner: &mut FrameCleaner,
    total_frames: usize,
    options: &ExecutionOptions,
    logger: &mut dyn PipelineLogger,
) -> Result<usize, WatermarkError> {
    let mut written = 0;
    let mut frames = reader.frames();

    loop {
        if options.is_cancelled() {
            return Err(WatermarkError::Cancelled);
        }

        let start = Instant::now();
        let Some(next) = frames.next() else {
            break;
        };
        let frame = next.map_err(WatermarkError::decode)?;
        logger.timing(STAGE_DECODE, elapsed_ms(start));

        let cleaned = cleaner.clean(&frame)?;
        cleaner.timings().report(logger);

        let start = Instant::now();
        writer.write(&cleaned).map_err(WatermarkError::encode)?;
        logger.timing(STAGE_ENCODE, elapsed_ms(start));

        written += 1;
        logger.progress(written, total_frames);
        options.report_progress(written, total_frames)?;
    }

    Ok(written)
}
