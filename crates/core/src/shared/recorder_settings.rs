use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CRF, DEFAULT_FFMPEG_PATH, DEFAULT_OUTPUT_PIXEL_FORMAT, DEFAULT_PRESET, NOMINAL_FPS,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("crf must be between 0 and 51, got {0}")]
    InvalidCrf(u32),
    #[error("fps must be positive")]
    ZeroFps,
}

/// Transcoding parameters passed to the encoder process.
///
/// The defaults reproduce the fixed command the recorder has always used:
/// 60 fps raw input, vertical flip, H.264 `yuv420p` at CRF 21, preset fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub ffmpeg_path: String,
    pub fps: u32,
    pub crf: u32,
    pub preset: String,
    pub output_pixel_format: String,
    pub vertical_flip: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
            fps: NOMINAL_FPS,
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            output_pixel_format: DEFAULT_OUTPUT_PIXEL_FORMAT.to_string(),
            vertical_flip: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    pub encoder: EncoderSettings,
    /// Where the first-frame still goes. `None` writes it to the working
    /// directory.
    pub snapshot_dir: Option<PathBuf>,
}

impl RecorderSettings {
    /// Reads settings from a JSON file. Fields missing from the file keep
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.encoder.crf > 51 {
            return Err(SettingsError::InvalidCrf(self.encoder.crf));
        }
        if self.encoder.fps == 0 {
            return Err(SettingsError::ZeroFps);
        }
        Ok(())
    }
}
