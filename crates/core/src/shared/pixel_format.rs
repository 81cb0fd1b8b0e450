use serde::{Deserialize, Serialize};

/// Interleaved 8-bit pixel layout of a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[default]
    Rgba,
    Rgb,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u8 {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
        }
    }

    /// Name ffmpeg uses for this layout in `-pix_fmt`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelFormat::Rgba => "rgba",
            PixelFormat::Rgb => "rgb24",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Rgba => write!(f, "RGBA"),
            PixelFormat::Rgb => write!(f, "RGB"),
        }
    }
}
