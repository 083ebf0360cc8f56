//! Writes small MPEG-4 clips for decoder and pipeline tests.

use std::path::Path;

use crate::shared::frame::Frame;

/// Encodes `num_frames` frames produced by `make_frame` at `fps`.
pub fn write_clip(
    path: &Path,
    num_frames: usize,
    width: u32,
    height: u32,
    fps: i32,
    make_frame: impl Fn(usize) -> Frame,
) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();
    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();

    encoder_ctx.set_width(width);
    encoder_ctx.set_height(height);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
    encoder_ctx.set_bit_rate(4_000_000);
    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&encoder);
    octx.write_header().unwrap();
    let ost_time_base = octx.stream(0).unwrap().time_base();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::format::Pixel::YUV420P,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    let drain = |encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
                 octx: &mut ffmpeg_next::format::context::Output| {
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(octx).unwrap();
        }
    };

    for i in 0..num_frames {
        let frame = make_frame(i);
        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
        );
        let stride = rgb.stride(0);
        let row_len = width as usize * 3;
        let dst = rgb.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_len).enumerate() {
            dst[row * stride..row * stride + row_len].copy_from_slice(src);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some(i as i64));
        encoder.send_frame(&yuv).unwrap();
        drain(&mut encoder, &mut octx);
    }

    encoder.send_eof().unwrap();
    drain(&mut encoder, &mut octx);
    octx.write_trailer().unwrap();
}

/// Clip of flat gray frames whose brightness steps by 40 per frame.
pub fn write_gray_ramp_clip(path: &Path, num_frames: usize, width: u32, height: u32) {
    write_clip(path, num_frames, width, height, 30, |i| {
        let value = ((i * 40) % 256) as u8;
        Frame::new(
            vec![value; (width * height * 3) as usize],
            width,
            height,
            3,
            i,
        )
    });
}
