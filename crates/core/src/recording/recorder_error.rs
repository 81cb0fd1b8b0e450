use std::path::PathBuf;

use thiserror::Error;

use crate::recording::recording_state::RecordingState;
use crate::timestamps::domain::timestamp_store::TimestampStoreError;

type BoxError = Box<dyn std::error::Error>;

#[derive(Error, Debug)]
pub enum RecorderError {
    // Initialization
    #[error("no frame source available")]
    FrameSourceUnavailable,
    #[error("frame source reports an empty {width}x{height} frame")]
    InvalidFrameSize { width: u32, height: u32 },
    #[error("output directory {path} is unusable: {reason}")]
    OutputDirectory { path: PathBuf, reason: String },

    // Recording start
    #[error("recorder is {0}; call init first")]
    NotInitialized(RecordingState),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("output directory is not set")]
    OutputDirectoryUnset,
    #[error("failed to launch encoder for {path}: {source}")]
    EncoderLaunch {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    // Per frame
    #[error("not recording")]
    NotRecording,
    #[error("failed to render frame: {0}")]
    Render(#[source] BoxError),
    #[error("staging image holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
    #[error("failed to write frame to encoder: {0}")]
    EncoderWrite(#[source] BoxError),

    // Finalization
    #[error("failed to persist timestamps: {0}")]
    Persist(#[from] TimestampStoreError),
}
