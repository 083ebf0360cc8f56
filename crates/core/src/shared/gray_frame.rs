use ndarray::ArrayView2;

/// Single-channel 8-bit pixel grid in row-major order.
///
/// Used both for the luma plane of a frame and for the watermark template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width as usize + x]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("GrayFrame data length must match dimensions")
    }
}
