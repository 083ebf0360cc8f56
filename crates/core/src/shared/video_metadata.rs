use std::path::PathBuf;

/// Fallback frame rate when the container does not report one.
pub const FALLBACK_FPS: f64 = 30.0;

/// Resolution and timing of a clip, as reported by the video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Exact rate as `(numerator, denominator)`, e.g. `(30000, 1001)`.
    pub frame_rate: Option<(i32, i32)>,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate to encode with; containers that report 0 fall back to 30.
    pub fn effective_fps(&self) -> f64 {
        if self.fps > 0.0 {
            self.fps
        } else {
            FALLBACK_FPS
        }
    }

    /// Rational frame rate to encode with.
    ///
    /// Prefers the exact rate; otherwise `fps` is approximated to 1/1000.
    pub fn effective_frame_rate(&self) -> (i32, i32) {
        if let Some((num, den)) = self.frame_rate {
            if num > 0 && den > 0 {
                return reduce(num, den);
            }
        }
        let millis = (self.effective_fps() * 1000.0).round().max(1.0) as i32;
        reduce(millis, 1000)
    }
}

fn reduce(num: i32, den: i32) -> (i32, i32) {
    let (mut a, mut b) = (num, den);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    (num / a, den / a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn meta(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps,
            frame_rate: None,
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_construction() {
        let m = meta(30.0);
        assert_eq!(m.width, 1920);
        assert_eq!(m.height, 1080);
        assert_eq!(m.total_frames, 900);
        assert_eq!(m.codec, "h264");
        assert_eq!(m.source_path, Some(PathBuf::from("/tmp/test.mp4")));
    }

    #[test]
    fn test_effective_fps_uses_reported_rate() {
        assert_relative_eq!(meta(24.0).effective_fps(), 24.0);
    }

    #[test]
    fn test_effective_fps_falls_back_when_unknown() {
        assert_relative_eq!(meta(0.0).effective_fps(), FALLBACK_FPS);
    }

    #[rstest]
    #[case::ntsc((30000, 1001), (30000, 1001))]
    #[case::film((24000, 1001), (24000, 1001))]
    #[case::pal_half((25, 2), (25, 2))]
    #[case::unreduced((60, 2), (30, 1))]
    fn test_exact_frame_rate_is_kept(#[case] reported: (i32, i32), #[case] expected: (i32, i32)) {
        let m = VideoMetadata {
            frame_rate: Some(reported),
            ..meta(reported.0 as f64 / reported.1 as f64)
        };
        assert_eq!(m.effective_frame_rate(), expected);
    }

    #[rstest]
    #[case(12.5, (25, 2))]
    #[case(29.97, (2997, 100))]
    #[case(25.0, (25, 1))]
    #[case(0.0, (30, 1))]
    fn test_frame_rate_approximated_from_fps(#[case] fps: f64, #[case] expected: (i32, i32)) {
        assert_eq!(meta(fps).effective_frame_rate(), expected);
    }

    #[test]
    fn test_invalid_exact_rate_ignored() {
        let m = VideoMetadata {
            frame_rate: Some((0, 1)),
            ..meta(0.0)
        };
        assert_eq!(m.effective_frame_rate(), (30, 1));
    }
}
