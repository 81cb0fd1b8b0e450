use std::path::Path;

use image::DynamicImage;

use crate::shared::frame::Frame;
use crate::shared::pixel_format::PixelFormat;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// Render targets are read back bottom row first, so by default the rows
/// are flipped to match the orientation of the encoded video.
pub struct ImageFileWriter {
    vertical_flip: bool,
}

impl ImageFileWriter {
    pub fn new() -> Self {
        Self {
            vertical_flip: true,
        }
    }

    pub fn with_vertical_flip(mut self, flip: bool) -> Self {
        self.vertical_flip = flip;
        self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let data = frame.data().to_vec();
        let img = match frame.format() {
            PixelFormat::Rgba => DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(frame.width(), frame.height(), data)
                    .ok_or("Failed to create image from frame data")?,
            ),
            PixelFormat::Rgb => DynamicImage::ImageRgb8(
                image::RgbImage::from_raw(frame.width(), frame.height(), data)
                    .ok_or("Failed to create image from frame data")?,
            ),
        };

        let img = if self.vertical_flip { img.flipv() } else { img };
        img.save(path)?;
        Ok(())
    }
}
