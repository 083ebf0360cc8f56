/// Minimum first-frame confidence accepted as a watermark match.
pub const DEFAULT_THRESHOLD: f64 = 0.35;

/// Mask growth beyond the matched box; 2 gives the 5x5 square kernel.
pub const DEFAULT_DILATION_RADIUS: u32 = 2;

/// Neighbourhood radius used by the fast-marching inpainter.
pub const DEFAULT_INPAINT_RADIUS: u32 = 3;

/// Bounded queue size between decode, clean and encode threads.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

/// Suffix appended to the input stem when no output path is given.
pub const OUTPUT_SUFFIX: &str = "_clean";
pub const OUTPUT_EXTENSION: &str = "mp4";
