use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encoder budget per pixel per frame.
const BITS_PER_PIXEL: f64 = 0.2;

/// Floor so small clips still get enough bits for a clean picture.
const MIN_BIT_RATE: usize = 1_000_000;

/// MPEG-4 Part 2 stores the time base denominator in 16 bits.
const MAX_TIME_SCALE: i32 = 65_535;

/// Bit rate for MPEG-4 at the given size and rate.
///
/// libavcodec's own default (200 kb/s) is far too low for anything above
/// thumbnail size, so the budget scales with the pixel rate.
pub fn target_bit_rate(width: u32, height: u32, fps: f64) -> usize {
    let pixel_rate = f64::from(width) * f64::from(height) * fps.max(1.0);
    ((pixel_rate * BITS_PER_PIXEL) as usize).max(MIN_BIT_RATE)
}

/// Encodes RGB frames to MPEG-4 Part 2 (YUV 4:2:0) via ffmpeg-next.
///
/// The container is picked from the output extension. Only video is
/// written; any audio in the source is not carried over.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(1, 1),
            frame_count: 0,
        }
    }

    /// Frames accepted since the last `open`.
    pub fn frames_written(&self) -> usize {
        self.frame_count
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx.stream(0).ok_or("output stream missing")?.time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            // One frame per packet, one tick per frame.
            encoded.set_duration(1);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        // One tick per frame, so 30000/1001 fps stays exactly that.
        let (num, den) = match metadata.effective_frame_rate() {
            (num, den) if num <= MAX_TIME_SCALE => (num, den),
            _ => VideoMetadata {
                frame_rate: None,
                ..metadata.clone()
            }
            .effective_frame_rate(),
        };
        let time_base = ffmpeg_next::Rational(den, num);
        let bit_rate = target_bit_rate(metadata.width, metadata.height, metadata.effective_fps());
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(num, den)));
        encoder_ctx.set_bit_rate(bit_rate);
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);
        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Encoding {} at {}x{} @ {num}/{den} fps, {} kb/s",
            path.display(),
            metadata.width,
            metadata.height,
            bit_rate / 1000
        );

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = time_base;
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            return Err("FfmpegWriter: not opened".into());
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(format!(
                "frame {} is {}x{}, output is {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );
        let stride = rgb_frame.stride(0);
        let width = self.width as usize;
        let dst = rgb_frame.data_mut(0);
        let channels = frame.channels() as usize;

        for (row, src) in frame.data().chunks_exact(width * channels).enumerate() {
            let out = &mut dst[row * stride..row * stride + width * 3];
            if channels == 3 {
                out.copy_from_slice(src);
            } else {
                for (rgb, &v) in out.chunks_exact_mut(3).zip(src) {
                    rgb.fill(v);
                }
            }
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&rgb_frame, &mut yuv_frame)?;
        }
        yuv_frame.set_pts(Some(self.frame_count as i64));

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_frame(&yuv_frame)?;
        }
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
            log::debug!("Encoder flushed after {} frames", self.frame_count);
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}
