use crate::shared::pixel_format::PixelFormat;

/// Shape of the raw stream handed to an encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub pixel_format: PixelFormat,
}

impl VideoMetadata {
    /// Bytes in one raw frame of this stream.
    pub fn frame_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.pixel_format.bytes_per_pixel() as usize
    }

    /// `WxH` as ffmpeg's `-s` expects it.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
