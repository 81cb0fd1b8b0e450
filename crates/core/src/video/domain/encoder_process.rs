use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// A running encoder consuming raw frames through a byte pipe.
///
/// Owning the handle means owning the process: implementations close the
/// pipe and reap the process on drop if `finish` was never called.
pub trait EncoderProcess: Send {
    /// Writes one complete raw frame to the pipe. May block while the
    /// encoder drains its input.
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>>;

    /// Closes the pipe and waits for the encoder to exit.
    fn finish(self: Box<Self>) -> Result<(), Box<dyn std::error::Error>>;
}

/// Starts encoder processes writing to a given output file.
pub trait EncoderLauncher: Send {
    fn launch(
        &self,
        output: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Box<dyn EncoderProcess>, Box<dyn std::error::Error>>;
}
