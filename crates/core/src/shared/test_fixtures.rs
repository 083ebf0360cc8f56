//! Synthetic frames and logos shared by unit tests.

use crate::shared::frame::Frame;
use crate::shared::gray_frame::GrayFrame;
use crate::template::domain::template::Template;

pub const LOGO_WIDTH: u32 = 70;
pub const LOGO_HEIGHT: u32 = 30;

fn hash(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x
        .wrapping_mul(73_856_093)
        ^ y.wrapping_mul(19_349_663)
        ^ seed.wrapping_add(1).wrapping_mul(83_492_791);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h & 0xff) as u8
}

/// RGB frame filled with deterministic per-pixel noise.
pub fn noise_frame(width: u32, height: u32, seed: u32, index: usize) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = hash(x, y, seed);
            data.extend_from_slice(&[v, v.wrapping_add(17), v.wrapping_sub(23)]);
        }
    }
    Frame::new(data, width, height, 3, index)
}

/// Non-periodic bar pattern standing in for a watermark logo.
pub fn logo(width: u32, height: u32) -> Template {
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let on = ((x * x) / 11 + y / 4) % 3 == 0;
            data.push(if on { 225 } else { 35 });
        }
    }
    Template::new(GrayFrame::new(data, width, height))
}

pub fn default_logo() -> Template {
    logo(LOGO_WIDTH, LOGO_HEIGHT)
}

/// Pastes the template opaquely (same value in every channel) at `(x, y)`.
pub fn paste(frame: &mut Frame, template: &Template, x: u32, y: u32) {
    let fw = frame.width() as usize;
    let channels = frame.channels() as usize;
    let tpl = template.pixels();
    let data = frame.data_mut();
    for ty in 0..tpl.height() as usize {
        for tx in 0..tpl.width() as usize {
            let v = tpl.get(tx, ty);
            let idx = ((y as usize + ty) * fw + x as usize + tx) * channels;
            data[idx..idx + channels].fill(v);
        }
    }
}

/// Noise frame with the logo pasted at `(x, y)`.
pub fn watermarked_frame(
    width: u32,
    height: u32,
    template: &Template,
    x: u32,
    y: u32,
    index: usize,
) -> Frame {
    let mut frame = noise_frame(width, height, index as u32, index);
    paste(&mut frame, template, x, y);
    frame
}
