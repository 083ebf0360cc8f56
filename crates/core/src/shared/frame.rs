use super::gray_frame::GrayFrame;

/// Fixed-point BT.601 luma weights, scaled by 2^14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// A single decoded video frame: interleaved bytes in row-major order.
///
/// Frames are either grayscale (1 channel) or RGB (3 channels). Format
/// conversion happens at I/O boundaries only.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert!(
            channels == 1 || channels == 3,
            "frames must have 1 or 3 channels"
        );
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Luma plane used for template matching.
    ///
    /// RGB input is weighted 0.299/0.587/0.114 with rounding; a single-channel
    /// frame is copied unchanged.
    pub fn to_gray(&self) -> GrayFrame {
        let pixels = if self.channels == 1 {
            self.data.clone()
        } else {
            self.data
                .chunks_exact(self.channels as usize)
                .map(|px| {
                    let sum = u32::from(px[0]) * LUMA_R
                        + u32::from(px[1]) * LUMA_G
                        + u32::from(px[2]) * LUMA_B;
                    ((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
                })
                .collect()
        };
        GrayFrame::new(pixels, self.width, self.height)
    }
}
