use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use unmark_core::localization::domain::bbox_stabilizer::RelocalizationPolicy;
use unmark_core::localization::infrastructure::localizer_factory::LocalizerKind;
use unmark_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use unmark_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use unmark_core::pipeline::pipeline_config::PipelineConfig;
use unmark_core::pipeline::pipeline_executor::PipelineExecutor;
use unmark_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use unmark_core::pipeline::remove_watermark_use_case::RemoveWatermarkUseCase;
use unmark_core::shared::constants::{OUTPUT_EXTENSION, OUTPUT_SUFFIX, VIDEO_EXTENSIONS};
use unmark_core::shared::error::WatermarkError;
use unmark_core::template::infrastructure::image_template_loader::ImageTemplateLoader;
use unmark_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use unmark_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Remove a static logo watermark from a video.
#[derive(Parser, Debug)]
#[command(name = "unmark", version)]
struct Cli {
    /// Input video (mp4, mov, mkv, avi or webm).
    input: PathBuf,

    /// Output video. Defaults to `<input-stem>_clean.mp4` next to the input.
    output: Option<PathBuf>,

    /// Grayscale or color image of the watermark logo.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Minimum match confidence on the first frame (0.0-1.0) [default: 0.35].
    #[arg(long)]
    threshold: Option<f64>,

    /// Pixels to grow the mask beyond the matched box [default: 2].
    #[arg(long)]
    dilation_radius: Option<u32>,

    /// Neighbourhood radius for inpainting [default: 3].
    #[arg(long)]
    inpaint_radius: Option<u32>,

    /// Re-run localization every N frames and keep the more confident match.
    #[arg(long)]
    refine_every: Option<usize>,

    /// Correlation strategy: direct or fft [default: direct].
    #[arg(long)]
    localizer: Option<LocalizerKind>,

    /// Decode, clean and encode on a single thread.
    #[arg(long)]
    sequential: bool,

    /// JSON file with pipeline settings; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    clean(&cli)
}

fn clean(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(cli)
        .and_then(|config| config.validate().map(|()| config))
        .map_err(|e| explain(&e))?;

    let executor: Box<dyn PipelineExecutor> = if config.threaded {
        Box::new(ThreadedPipelineExecutor::new(config.channel_capacity))
    } else {
        Box::new(SequentialPipelineExecutor::new())
    };

    let output = config.output_path.clone();
    let template = ImageTemplateLoader::new(config.template_path.clone());
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rCleaning frame {current}/{total}");
        } else {
            eprint!("\rCleaning frame {current}");
        }
        true
    });

    let mut use_case = RemoveWatermarkUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(template),
        executor,
        config,
    )
    .with_progress(progress)
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let result = use_case.execute(&cli.input);
    eprintln!();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            // Anything already at the output path is not ours to delete
            // unless this run started writing it.
            if use_case.output_touched() {
                discard_partial_output(&output);
            }
            return Err(explain(&e).into());
        }
    };

    if let Err(e) = check_output(&output) {
        discard_partial_output(&output);
        return Err(e);
    }

    if let Some(b) = summary.watermark_box {
        log::info!(
            "Inpainted {}x{} region at ({}, {})",
            b.width,
            b.height,
            b.x,
            b.y
        );
    }
    log::info!(
        "Cleaned {} frames ({} localization passes), output written to {}",
        summary.frames_written,
        summary.localization_calls,
        output.display()
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_file() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_video(&cli.input) {
        return Err(format!(
            "Unsupported input type: {} (expected one of: {})",
            cli.input.display(),
            VIDEO_EXTENSIONS.join(", ")
        )
        .into());
    }
    if let Some(threshold) = cli.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!("Threshold must be between 0.0 and 1.0, got {threshold}").into());
        }
    }
    if cli.inpaint_radius == Some(0) {
        return Err("Inpaint radius must be at least 1".into());
    }
    if cli.refine_every == Some(0) {
        return Err("--refine-every must be at least 1".into());
    }
    if cli.template.is_none() && cli.config.is_none() {
        return Err("A watermark template is required (--template or --config)".into());
    }
    if let Some(output) = &cli.output {
        if output == &cli.input {
            return Err("Output must not overwrite the input".into());
        }
    }
    Ok(())
}

/// Config file values (or defaults), overridden by any flag given.
fn resolve_config(cli: &Cli) -> Result<PipelineConfig, WatermarkError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(template) = &cli.template {
        config.template_path = template.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(radius) = cli.dilation_radius {
        config.dilation_radius = radius;
    }
    if let Some(radius) = cli.inpaint_radius {
        config.inpaint_radius = radius;
    }
    if let Some(interval) = cli.refine_every {
        config.relocalization = RelocalizationPolicy::Refine { interval };
    }
    if let Some(kind) = cli.localizer {
        config.localizer = kind;
    }
    if cli.sequential {
        config.threaded = false;
    }

    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    } else if config.output_path.as_os_str().is_empty() {
        config.output_path = default_output_path(&cli.input);
    }
    Ok(config)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{OUTPUT_EXTENSION}"))
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// An encoder that silently produced nothing counts as a failed run.
fn check_output(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(explain(&WatermarkError::Encode(format!(
            "no output was produced at {}",
            output.display()
        )))
        .into()),
    }
}

fn discard_partial_output(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            log::warn!("Could not remove partial output {}: {e}", output.display());
        }
    }
}

/// The error plus what the user can do about it.
fn explain(err: &WatermarkError) -> String {
    let hint = match err {
        WatermarkError::TemplateLoad { .. } => {
            "check that --template points to a readable image file"
        }
        WatermarkError::InvalidFrameDimensions { .. } => {
            "the template must be smaller than the video; crop it to just the logo"
        }
        WatermarkError::WatermarkNotFound { .. } => {
            "try a lower --threshold, or a template cropped from this video"
        }
        WatermarkError::Decode(_) => "the input may be corrupt or use an unsupported codec",
        WatermarkError::Encode(_) => "check free disk space and write access to the output path",
        WatermarkError::InvalidConfig(_) => "fix the flag or config file value named above",
        WatermarkError::MaskDimensions { .. }
        | WatermarkError::Cancelled
        | WatermarkError::AlreadyExecuted => return err.to_string(),
    };
    format!("{err}\n  hint: {hint}")
}
