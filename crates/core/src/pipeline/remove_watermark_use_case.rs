use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::inpainting::domain::inpainter::Inpainter;
use crate::inpainting::infrastructure::telea_inpainter::TeleaInpainter;
use crate::localization::domain::localizer::Localizer;
use crate::localization::infrastructure::localizer_factory::create_localizer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::template::domain::template_source::TemplateSource;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_cleaner::FrameCleaner;
use super::pipeline_config::PipelineConfig;
use super::pipeline_executor::{ExecutionOptions, PipelineExecutor, ProgressCallback};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Outcome of a successful run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemovalSummary {
    pub frames_written: usize,
    pub localization_calls: usize,
    /// Region that was inpainted on the last frame; `None` for an empty clip.
    pub watermark_box: Option<BoundingBox>,
}

/// Marks `touched` as soon as the output is about to be created.
struct OutputTracker {
    inner: Box<dyn VideoWriter>,
    touched: Arc<AtomicBool>,
}

impl VideoWriter for OutputTracker {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.touched.store(true, Ordering::Relaxed);
        self.inner.open(path, metadata)
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.inner.write(frame)
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.inner.close()
    }
}

/// Removes a watermark from one clip.
///
/// Loads the template, opens the clip, builds a [`FrameCleaner`] and hands
/// everything to a [`PipelineExecutor`]. Single-use: `execute` consumes the
/// owned components, so a second call fails with `AlreadyExecuted`.
pub struct RemoveWatermarkUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    template_source: Option<Box<dyn TemplateSource>>,
    localizer: Option<Box<dyn Localizer>>,
    inpainter: Option<Box<dyn Inpainter>>,
    executor: Box<dyn PipelineExecutor>,
    config: PipelineConfig,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
    output_touched: Arc<AtomicBool>,
    logger: Box<dyn PipelineLogger>,
}

impl RemoveWatermarkUseCase {
    /// Localizer and inpainter default to the ones `config` names.
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        template_source: Box<dyn TemplateSource>,
        executor: Box<dyn PipelineExecutor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            template_source: Some(template_source),
            localizer: None,
            inpainter: None,
            executor,
            config,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            output_touched: Arc::new(AtomicBool::new(false)),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_localizer(mut self, localizer: Box<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn with_inpainter(mut self, inpainter: Box<dyn Inpainter>) -> Self {
        self.inpainter = Some(inpainter);
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Whether this run got as far as creating the output file.
    ///
    /// Failures before that point (template, config, input) leave whatever
    /// already sits at the output path alone.
    pub fn output_touched(&self) -> bool {
        self.output_touched.load(Ordering::Relaxed)
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<RemovalSummary, WatermarkError> {
        let mut reader = self.reader.take().ok_or(WatermarkError::AlreadyExecuted)?;
        let writer: Box<dyn VideoWriter> = Box::new(OutputTracker {
            inner: self.writer.take().ok_or(WatermarkError::AlreadyExecuted)?,
            touched: self.output_touched.clone(),
        });
        let template_source = self
            .template_source
            .take()
            .ok_or(WatermarkError::AlreadyExecuted)?;

        let prepared = self.config.validate().and_then(|()| {
            let template = Arc::new(template_source.load()?);
            self.logger.info(&format!(
                "Template {}x{} loaded from {}",
                template.width(),
                template.height(),
                self.config.template_path.display()
            ));
            let localizer = self
                .localizer
                .take()
                .unwrap_or_else(|| create_localizer(self.config.localizer));
            let inpainter = self
                .inpainter
                .take()
                .unwrap_or_else(|| Box::new(TeleaInpainter::new(self.config.inpaint_radius)));
            FrameCleaner::new(template, localizer, inpainter, &self.config)
        });
        let mut cleaner = match prepared {
            Ok(cleaner) => cleaner,
            Err(e) => {
                reader.close();
                return Err(e);
            }
        };

        let metadata = match reader.open(input_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                reader.close();
                return Err(WatermarkError::decode(e));
            }
        };
        self.logger.info(&format!(
            "Input {}: {}x{} @ {:.2} fps, {} frames",
            input_path.display(),
            metadata.width,
            metadata.height,
            metadata.effective_fps(),
            metadata.total_frames
        ));

        let options = ExecutionOptions {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        let frames_written = self.executor.execute(
            reader,
            writer,
            &mut cleaner,
            &metadata,
            &self.config.output_path,
            &options,
            &mut *self.logger,
        )?;

        self.logger.summary();
        Ok(RemovalSummary {
            frames_written,
            localization_calls: cleaner.localization_calls(),
            watermark_box: cleaner.current_box(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::domain::mask::Mask;
    use crate::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
    use crate::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
    use crate::pipeline::pipeline_logger::{
        StdoutPipelineLogger, STAGE_DECODE, STAGE_ENCODE, STAGE_INPAINT, STAGE_LOCALIZE, STAGE_MASK,
    };
    use crate::shared::test_fixtures::{default_logo, logo, noise_frame, watermarked_frame};
    use crate::template::domain::template::Template;
    use crate::template::infrastructure::image_template_loader::ImageTemplateLoader;
    use rstest::rstest;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Result<Frame, String>>,
        width: u32,
        height: u32,
        fail_open: bool,
        closed: Arc<Mutex<usize>>,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>) -> Self {
            let (width, height) = frames
                .first()
                .map(|f| (f.width(), f.height()))
                .unwrap_or((160, 120));
            Self {
                frames: frames.into_iter().map(Ok).collect(),
                width,
                height,
                fail_open: false,
                closed: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("unsupported container".into());
            }
            Ok(VideoMetadata {
                width: self.width,
                height: self.height,
                fps: 30.0,
                total_frames: self.frames.len(),
                frame_rate: Some((30, 1)),
                codec: "stub".to_string(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frames.drain(..).map(|f| f.map_err(Into::into)))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
        fail_at: Option<usize>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
                fail_at: None,
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            let mut written = self.written.lock().unwrap();
            if Some(written.len()) == self.fail_at {
                return Err("disk full".into());
            }
            written.push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    struct StubTemplate(Template);

    impl TemplateSource for StubTemplate {
        fn load(&self) -> Result<Template, WatermarkError> {
            Ok(self.0.clone())
        }
    }

    struct MissingTemplate;

    impl TemplateSource for MissingTemplate {
        fn load(&self) -> Result<Template, WatermarkError> {
            Err(WatermarkError::TemplateLoad {
                path: "missing.png".into(),
                reason: "not found".to_string(),
            })
        }
    }

    /// Leaves frames unchanged so tests can check order without inpainting cost.
    struct PassthroughInpainter {
        masks: Arc<Mutex<Vec<Mask>>>,
    }

    impl Inpainter for PassthroughInpainter {
        fn inpaint(&self, frame: &Frame, mask: &Mask) -> Result<Frame, WatermarkError> {
            self.masks.lock().unwrap().push(mask.clone());
            Ok(frame.clone())
        }
    }

    // --- Helpers ---

    fn config() -> PipelineConfig {
        PipelineConfig::new("logo.png", "out.mp4")
    }

    fn executor(threaded: bool) -> Box<dyn PipelineExecutor> {
        if threaded {
            Box::new(ThreadedPipelineExecutor::new(2))
        } else {
            Box::new(SequentialPipelineExecutor::new())
        }
    }

    /// Scenario clip: logo at (50, 50) on every frame over changing noise.
    fn watermarked_clip(count: usize) -> Vec<Frame> {
        let template = default_logo();
        (0..count)
            .map(|i| watermarked_frame(160, 120, &template, 50, 50, i))
            .collect()
    }

    struct Run {
        result: Result<RemovalSummary, WatermarkError>,
        written: Vec<Frame>,
        reader_closes: usize,
        writer_closed: bool,
        output_touched: bool,
    }

    fn run_with(
        reader: StubReader,
        writer: StubWriter,
        use_case: impl FnOnce(RemoveWatermarkUseCase) -> RemoveWatermarkUseCase,
        template: Box<dyn TemplateSource>,
        threaded: bool,
    ) -> Run {
        let reader_closed = reader.closed.clone();
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let mut uc = use_case(RemoveWatermarkUseCase::new(
            Box::new(reader),
            Box::new(writer),
            template,
            executor(threaded),
            config(),
        ));
        let result = uc.execute(Path::new("input.mp4"));
        let output_touched = uc.output_touched();

        let written = written.lock().unwrap().clone();
        let reader_closes = *reader_closed.lock().unwrap();
        let writer_closed = *writer_closed.lock().unwrap();
        Run {
            result,
            written,
            reader_closes,
            writer_closed,
            output_touched,
        }
    }

    fn run(frames: Vec<Frame>, threaded: bool) -> Run {
        run_with(
            StubReader::new(frames),
            StubWriter::new(),
            |uc| uc,
            Box::new(StubTemplate(default_logo())),
            threaded,
        )
    }

    // --- Tests ---

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_static_logo_located_once_and_every_frame_written(#[case] threaded: bool) {
        let clip = watermarked_clip(10);
        let masks = Arc::new(Mutex::new(Vec::new()));
        let inpainter = PassthroughInpainter {
            masks: masks.clone(),
        };

        let run = run_with(
            StubReader::new(clip.clone()),
            StubWriter::new(),
            |uc| uc.with_inpainter(Box::new(inpainter)),
            Box::new(StubTemplate(default_logo())),
            threaded,
        );

        let summary = run.result.unwrap();
        assert_eq!(summary.frames_written, 10);
        assert_eq!(summary.localization_calls, 1);
        assert_eq!(run.written, clip);
        let b = summary.watermark_box.unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (50, 50, 70, 30));

        let masks = masks.lock().unwrap();
        assert_eq!(masks.len(), 10);
        assert!(masks.iter().all(|m| m == &masks[0]));
        assert_eq!(masks[0].bounds(), Some((48, 48, 74, 34)));
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_missing_logo_on_first_frame_writes_nothing(#[case] threaded: bool) {
        let mut clip = watermarked_clip(5);
        clip[0] = noise_frame(160, 120, 99, 0);

        let run = run(clip, threaded);
        match run.result.unwrap_err() {
            WatermarkError::WatermarkNotFound { confidence, .. } => assert!(confidence < 0.35),
            other => panic!("unexpected error: {other}"),
        }
        assert!(run.written.is_empty());
        assert!(run.reader_closes >= 1);
        assert!(run.writer_closed);
        // The writer was opened, so a partial output may exist.
        assert!(run.output_touched);
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_template_larger_than_frame(#[case] threaded: bool) {
        let frames = vec![Frame::new(vec![0; 60 * 20 * 3], 60, 20, 3, 0)];
        let run = run(frames, threaded);

        assert!(matches!(
            run.result,
            Err(WatermarkError::InvalidFrameDimensions { .. })
        ));
        assert!(run.written.is_empty());
        assert!(run.writer_closed);
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_two_runs_are_identical(#[case] threaded: bool) {
        let first = run(watermarked_clip(3), threaded);
        let second = run(watermarked_clip(3), threaded);
        assert!(first.result.is_ok());
        assert_eq!(first.written, second.written);
    }

    #[test]
    fn test_threaded_matches_sequential() {
        let sequential = run(watermarked_clip(4), false);
        let threaded = run(watermarked_clip(4), true);
        assert_eq!(sequential.written, threaded.written);
    }

    #[test]
    fn test_pixels_outside_mask_pass_through() {
        let clip = watermarked_clip(2);
        let run = run(clip.clone(), false);
        run.result.unwrap();

        let mask = crate::masking::domain::mask_builder::MaskBuilder::new(2).build(
            &BoundingBox::new(50, 50, 70, 30, 1.0),
            160,
            120,
        );
        for (before, after) in clip.iter().zip(&run.written) {
            assert_eq!(before.index(), after.index());
            for y in 0..120 {
                for x in 0..160 {
                    if !mask.is_set(x, y) {
                        let i = ((y * 160 + x) * 3) as usize;
                        assert_eq!(before.data()[i..i + 3], after.data()[i..i + 3]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_lower_threshold_via_config_accepts_weaker_match() {
        // A faded logo: blend the template at 40% over noise.
        let template = logo(70, 30);
        let mut frame = noise_frame(160, 120, 5, 0);
        let tpl = template.pixels();
        let data = frame.data_mut();
        for ty in 0..30usize {
            for tx in 0..70usize {
                let idx = ((50 + ty) * 160 + 50 + tx) * 3;
                for c in 0..3 {
                    let bg = f64::from(data[idx + c]);
                    let fg = f64::from(tpl.get(tx, ty));
                    data[idx + c] = (0.6 * bg + 0.4 * fg).round() as u8;
                }
            }
        }

        let mut strict = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(vec![frame.clone()])),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(template.clone())),
            executor(false),
            PipelineConfig {
                threshold: 0.99,
                ..config()
            },
        );
        assert!(matches!(
            strict.execute(Path::new("in.mp4")),
            Err(WatermarkError::WatermarkNotFound { .. })
        ));

        let mut relaxed = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(vec![frame])),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(template)),
            executor(false),
            PipelineConfig {
                threshold: 0.0,
                ..config()
            },
        );
        assert_eq!(relaxed.execute(Path::new("in.mp4")).unwrap().frames_written, 1);
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_decode_error_propagates_and_closes_streams(#[case] threaded: bool) {
        let mut reader = StubReader::new(watermarked_clip(3));
        reader.frames[2] = Err("truncated packet".to_string());

        let run = run_with(
            reader,
            StubWriter::new(),
            |uc| uc,
            Box::new(StubTemplate(default_logo())),
            threaded,
        );
        match run.result.unwrap_err() {
            WatermarkError::Decode(msg) => assert!(msg.contains("truncated packet")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(run.written.len(), 2);
        assert!(run.reader_closes >= 1);
        assert!(run.writer_closed);
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_encode_error_propagates_and_closes_streams(#[case] threaded: bool) {
        let mut writer = StubWriter::new();
        writer.fail_at = Some(1);

        let run = run_with(
            StubReader::new(watermarked_clip(4)),
            writer,
            |uc| uc,
            Box::new(StubTemplate(default_logo())),
            threaded,
        );
        match run.result.unwrap_err() {
            WatermarkError::Encode(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(run.reader_closes >= 1);
        assert!(run.writer_closed);
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_template_load_failure_before_any_frame(#[case] threaded: bool) {
        let run = run_with(
            StubReader::new(watermarked_clip(2)),
            StubWriter::new(),
            |uc| uc,
            Box::new(MissingTemplate),
            threaded,
        );
        assert!(matches!(run.result, Err(WatermarkError::TemplateLoad { .. })));
        assert!(run.written.is_empty());
        assert_eq!(run.reader_closes, 1);
        assert!(!run.output_touched);
    }

    #[test]
    fn test_template_file_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let template = default_logo();
        image::GrayImage::from_raw(70, 30, template.pixels().data().to_vec())
            .unwrap()
            .save(&path)
            .unwrap();

        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(watermarked_clip(2))),
            Box::new(StubWriter::new()),
            Box::new(ImageTemplateLoader::new(&path)),
            executor(false),
            PipelineConfig::new(&path, "out.mp4"),
        );
        assert_eq!(uc.execute(Path::new("in.mp4")).unwrap().frames_written, 2);
    }

    #[test]
    fn test_open_failure_is_decode_error() {
        let mut reader = StubReader::new(watermarked_clip(1));
        reader.fail_open = true;

        let run = run_with(
            reader,
            StubWriter::new(),
            |uc| uc,
            Box::new(StubTemplate(default_logo())),
            false,
        );
        assert!(matches!(run.result, Err(WatermarkError::Decode(_))));
        assert_eq!(run.reader_closes, 1);
        assert!(!run.writer_closed);
        assert!(!run.output_touched);
    }

    #[test]
    fn test_invalid_config_rejected_before_processing() {
        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(watermarked_clip(1))),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(default_logo())),
            executor(false),
            PipelineConfig {
                threshold: 2.0,
                ..config()
            },
        );
        assert!(matches!(
            uc.execute(Path::new("in.mp4")),
            Err(WatermarkError::InvalidConfig(_))
        ));
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_progress_callback_can_cancel(#[case] threaded: bool) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = seen.clone();

        let run = run_with(
            StubReader::new(watermarked_clip(6)),
            StubWriter::new(),
            move |uc| {
                uc.with_progress(Box::new(move |current, total| {
                    seen_in_cb.lock().unwrap().push((current, total));
                    current < 2
                }))
            },
            Box::new(StubTemplate(default_logo())),
            threaded,
        );

        assert!(matches!(run.result, Err(WatermarkError::Cancelled)));
        assert_eq!(*seen.lock().unwrap(), vec![(1, 6), (2, 6)]);
        assert!(run.written.len() <= 2);
        assert!(run.writer_closed);
    }

    #[test]
    fn test_preset_cancel_flag_stops_run() {
        let flag = Arc::new(AtomicBool::new(true));
        let run = run_with(
            StubReader::new(watermarked_clip(3)),
            StubWriter::new(),
            |uc| uc.with_cancel_flag(flag.clone()),
            Box::new(StubTemplate(default_logo())),
            false,
        );
        assert!(matches!(run.result, Err(WatermarkError::Cancelled)));
        assert!(run.written.is_empty());
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_empty_clip_succeeds_with_zero_frames() {
        let run = run(Vec::new(), false);
        let summary = run.result.unwrap();
        assert_eq!(summary.frames_written, 0);
        assert!(summary.watermark_box.is_none());
        assert!(run.writer_closed);
        assert!(run.output_touched);
    }

    #[test]
    fn test_execute_twice_fails() {
        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(watermarked_clip(1))),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(default_logo())),
            executor(false),
            config(),
        );
        uc.execute(Path::new("in.mp4")).unwrap();
        assert!(matches!(
            uc.execute(Path::new("in.mp4")),
            Err(WatermarkError::AlreadyExecuted)
        ));
    }

    #[test]
    fn test_refine_policy_relocalizes() {
        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(watermarked_clip(6))),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(default_logo())),
            executor(false),
            PipelineConfig {
                relocalization:
                    crate::localization::domain::bbox_stabilizer::RelocalizationPolicy::Refine {
                        interval: 2,
                    },
                ..config()
            },
        );
        let summary = uc.execute(Path::new("in.mp4")).unwrap();
        // frames 0, 2 and 4
        assert_eq!(summary.localization_calls, 3);
    }

    /// Collects the stage names it is given.
    struct RecordingLogger {
        stages: Arc<Mutex<Vec<String>>>,
        progress: Arc<Mutex<Vec<usize>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, _total: usize) {
            self.progress.lock().unwrap().push(current);
        }
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.stages.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn info(&mut self, _message: &str) {}
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::threaded(true)]
    fn test_logger_receives_every_stage(#[case] threaded: bool) {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let progress = Arc::new(Mutex::new(Vec::new()));
        let logger = RecordingLogger {
            stages: stages.clone(),
            progress: progress.clone(),
        };

        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(StubReader::new(watermarked_clip(3))),
            Box::new(StubWriter::new()),
            Box::new(StubTemplate(default_logo())),
            executor(threaded),
            config(),
        )
        .with_logger(Box::new(logger));
        uc.execute(Path::new("in.mp4")).unwrap();

        let stages = stages.lock().unwrap();
        for stage in [STAGE_DECODE, STAGE_LOCALIZE, STAGE_MASK, STAGE_INPAINT, STAGE_ENCODE] {
            assert_eq!(
                stages.iter().filter(|s| s.as_str() == stage).count(),
                3,
                "stage {stage}"
            );
        }
        assert_eq!(*progress.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_stdout_logger_summary_after_run() {
        let mut logger = StdoutPipelineLogger::new(1);
        let mut cleaner = FrameCleaner::from_config(Arc::new(default_logo()), &config()).unwrap();
        for frame in watermarked_clip(2) {
            cleaner.clean(&frame).unwrap();
            cleaner.timings().report(&mut logger);
        }
        assert_eq!(logger.stage_stats(STAGE_INPAINT).unwrap().count, 2);
        assert!(logger.summary_string().unwrap().contains(STAGE_LOCALIZE));
    }

    #[test]
    fn test_end_to_end_with_ffmpeg() {
        use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
        use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
        use crate::video::infrastructure::test_video::write_clip;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("in_clean.mp4");
        let template = default_logo();
        write_clip(&input, 6, 160, 120, 30, |i| {
            watermarked_frame(160, 120, &template, 50, 50, i)
        });

        let mut uc = RemoveWatermarkUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(StubTemplate(default_logo())),
            executor(true),
            PipelineConfig::new("logo.png", &output),
        );
        let summary = uc.execute(&input).unwrap();
        assert_eq!(summary.frames_written, 6);
        assert_eq!(summary.localization_calls, 1);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&output).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert_eq!(reader.frames().filter(|f| f.is_ok()).count(), 6);
    }
}
