use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::pixel_format::PixelFormat;

/// Staging image for one captured frame: interleaved 8-bit pixels in
/// row-major order, exactly as the frame source produced them.
///
/// The buffer is allocated once per binding and overwritten on every
/// capture, so its length never changes after construction.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        debug_assert_eq!(
            data.len(),
            Self::byte_len(width, height, format),
            "data length must equal width * height * bytes_per_pixel"
        );
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Zero-filled frame sized for the given dimensions and layout.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(
            vec![0; Self::byte_len(width, height, format)],
            width,
            height,
            format,
        )
    }

    /// Number of bytes a full frame of this shape occupies.
    pub fn byte_len(width: u32, height: u32, format: PixelFormat) -> usize {
        (width as usize) * (height as usize) * (format.bytes_per_pixel() as usize)
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

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.format.bytes_per_pixel() as usize,
        )
    }
}
