use std::collections::HashMap;
use std::time::Instant;

pub const STAGE_DECODE: &str = "decode";
pub const STAGE_LOCALIZE: &str = "localize";
pub const STAGE_MASK: &str = "mask";
pub const STAGE_INPAINT: &str = "inpaint";
pub const STAGE_ENCODE: &str = "encode";

/// Observer for pipeline progress and per-stage cost.
///
/// Executors report through this trait so the CLI, tests and any embedding
/// application can each decide what to do with the numbers.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// Time one stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Combined time of one stage over `frames` frames.
    ///
    /// Default: spread evenly over `timing` calls.
    fn timing_batch(&mut self, stage: &str, frames: usize, total_ms: f64) {
        if frames == 0 {
            return;
        }
        let each = total_ms / frames as f64;
        for _ in 0..frames {
            self.timing(stage, each);
        }
    }

    /// Point-in-time sample, e.g. queue depth.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count and total of one stage or metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: usize,
    pub total: f64,
}

impl StageStats {
    fn add(&mut self, count: usize, total: f64) {
        self.count += count;
        self.total += total;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Accumulates stage timings and metrics and logs a throughput summary.
///
/// Progress lines go out every `throttle_frames` frames and on the last one.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, StageStats>,
    metrics: HashMap<String, StageStats>,
    start_time: Instant,
    frames_done: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_done: 0,
        }
    }

    /// Formatted report, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_done;
        let mut lines = vec![format!(
            "Pipeline summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (stage, stats) in sorted(&self.timings) {
            let total_ms = stats.total;
            let avg_ms = stats.mean();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        for (name, stats) in sorted(&self.metrics) {
            lines.push(format!("  {name}: avg {:.1}", stats.mean()));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn stage_stats(&self, stage: &str) -> Option<StageStats> {
        self.timings.get(stage).copied()
    }
}

fn sorted(map: &HashMap<String, StageStats>) -> Vec<(&str, StageStats)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_done = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        } else {
            // Some containers do not report a frame count.
            log::info!("Processing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timing_batch(stage, 1, duration_ms);
    }

    fn timing_batch(&mut self, stage: &str, frames: usize, total_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .add(frames, total_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().add(1, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
