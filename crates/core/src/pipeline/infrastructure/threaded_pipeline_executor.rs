use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::frame_cleaner::{elapsed_ms, FrameCleaner};
use crate::pipeline::pipeline_executor::{ExecutionOptions, PipelineExecutor};
use crate::pipeline::pipeline_logger::{PipelineLogger, STAGE_DECODE, STAGE_ENCODE};
use crate::shared::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// A decoded frame and how long decoding it took.
type Decoded = Result<(Frame, f64), SendError>;

/// What the writer thread hands back once its queue drains.
struct WriterOutcome {
    frames_encoded: usize,
    encode_ms: f64,
    result: Result<(), SendError>,
}

/// Decode and encode on dedicated threads, cleaning on the caller's.
///
/// Layout: `reader → [bounded] → main (clean) → [bounded] → writer`
///
/// Frames travel through FIFO channels and are cleaned in arrival order, so
/// output order matches the sequential executor exactly.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
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

        let cap = self.channel_capacity;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Decoded>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, options.cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let main_result = run_main_loop(
            frame_rx,
            &write_tx,
            cleaner,
            metadata.total_frames,
            options,
            logger,
        );

        drop(write_tx);

        join_threads(reader_handle, writer_handle, main_result, logger)
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Decoded>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        {
            let mut frames = reader.frames();
            loop {
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                let start = Instant::now();
                let Some(next) = frames.next() else {
                    break;
                };
                let failed = next.is_err();
                let item = next
                    .map(|frame| (frame, elapsed_ms(start)))
                    .map_err(|e| -> SendError { e.to_string().into() });
                // A closed channel means the main loop has stopped.
                if frame_tx.send(item).is_err() || failed {
                    break;
                }
            }
        }
        reader.close();
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: crossbeam_channel::Receiver<Frame>,
) -> std::thread::JoinHandle<WriterOutcome> {
    std::thread::spawn(move || {
        let mut frames_encoded = 0;
        let mut encode_ms = 0.0;
        let mut result = Ok(());

        for frame in write_rx.iter() {
            let start = Instant::now();
            if let Err(e) = writer.write(&frame) {
                result = Err(e.to_string().into());
                break;
            }
            encode_ms += elapsed_ms(start);
            frames_encoded += 1;
        }

        let closed = writer.close();
        if result.is_ok() {
            result = closed.map_err(|e| -> SendError { e.to_string().into() });
        }
        WriterOutcome {
            frames_encoded,
            encode_ms,
            result,
        }
    })
}

/// Cleans frames in arrival order and forwards them to the writer.
fn run_main_loop(
    frame_rx: crossbeam_channel::Receiver<Decoded>,
    write_tx: &crossbeam_channel::Sender<Frame>,
    cleaner: &mut FrameCleaner,
    total_frames: usize,
    options: &ExecutionOptions,
    logger: &mut dyn PipelineLogger,
) -> Result<usize, WatermarkError> {
    let mut written = 0;

    for decoded in frame_rx.iter() {
        if options.is_cancelled() {
            return Err(WatermarkError::Cancelled);
        }
        logger.metric("reader_queue_depth", frame_rx.len() as f64);

        let (frame, decode_ms) = decoded.map_err(WatermarkError::decode)?;
        logger.timing(STAGE_DECODE, decode_ms);

        let cleaned = cleaner.clean(&frame)?;
        cleaner.timings().report(logger);

        if write_tx.send(cleaned).is_err() {
            // The writer thread has failed; its own error is reported at join.
            return Err(WatermarkError::Encode("writer stopped".to_string()));
        }

        written += 1;
        logger.progress(written, total_frames);
        options.report_progress(written, total_frames)?;
    }

    // The reader also stops on cancellation, which looks like end of stream.
    if options.is_cancelled() {
        return Err(WatermarkError::Cancelled);
    }
    Ok(written)
}

/// Joins both threads. A writer failure outranks the main loop's error,
/// which in that case only says the queue closed.
fn join_threads(
    reader_handle: std::thread::JoinHandle<()>,
    writer_handle: std::thread::JoinHandle<WriterOutcome>,
    main_result: Result<usize, WatermarkError>,
    logger: &mut dyn PipelineLogger,
) -> Result<usize, WatermarkError> {
    let writer_result = match writer_handle.join() {
        Ok(outcome) => {
            logger.timing_batch(STAGE_ENCODE, outcome.frames_encoded, outcome.encode_ms);
            outcome.result.map_err(WatermarkError::encode)
        }
        Err(_) => Err(WatermarkError::Encode("writer thread panicked".to_string())),
    };

    let reader_result = reader_handle
        .join()
        .map_err(|_| WatermarkError::Decode("reader thread panicked".to_string()));

    writer_result?;
    let written = main_result?;
    reader_result?;
    Ok(written)
}
