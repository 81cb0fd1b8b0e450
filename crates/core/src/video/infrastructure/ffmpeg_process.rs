use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::shared::recorder_settings::EncoderSettings;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::encoder_process::{EncoderLauncher, EncoderProcess};

/// Builds the ffmpeg invocation that turns raw frames on stdin into a
/// compressed video at `output`, overwriting any existing file.
pub fn build_ffmpeg_command(
    settings: &EncoderSettings,
    output: &Path,
    metadata: &VideoMetadata,
) -> Command {
    let mut cmd = Command::new(&settings.ffmpeg_path);
    cmd.arg("-hide_banner").arg("-loglevel").arg("warning");

    // Raw input on stdin
    cmd.arg("-r").arg(settings.fps.to_string());
    cmd.arg("-f").arg("rawvideo");
    cmd.arg("-pix_fmt").arg(metadata.pixel_format.ffmpeg_name());
    cmd.arg("-s").arg(metadata.size_arg());
    cmd.arg("-i").arg("-");

    // Encoding options
    cmd.arg("-threads").arg("0");
    cmd.arg("-preset").arg(&settings.preset);
    cmd.arg("-y");
    cmd.arg("-pix_fmt").arg(&settings.output_pixel_format);
    cmd.arg("-crf").arg(settings.crf.to_string());
    if settings.vertical_flip {
        cmd.arg("-vf").arg("vflip");
    }

    cmd.arg(output);
    cmd.stdout(Stdio::null()).stderr(Stdio::inherit());
    cmd
}

/// Launches one ffmpeg process per recording.
pub struct FfmpegLauncher {
    settings: EncoderSettings,
}

impl FfmpegLauncher {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }
}

impl Default for FfmpegLauncher {
    fn default() -> Self {
        Self::new(EncoderSettings::default())
    }
}

impl EncoderLauncher for FfmpegLauncher {
    fn launch(
        &self,
        output: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Box<dyn EncoderProcess>, Box<dyn std::error::Error>> {
        let cmd = build_ffmpeg_command(&self.settings, output, metadata);
        let process = FfmpegProcess::spawn(cmd).map_err(|e| {
            format!(
                "failed to start encoder '{}' for {}: {e}",
                self.settings.ffmpeg_path,
                output.display()
            )
        })?;
        log::debug!(
            "Encoder started (pid {}) for {} at {} {}",
            process.id(),
            output.display(),
            metadata.size_arg(),
            metadata.pixel_format
        );
        Ok(Box::new(process))
    }
}

/// A child process fed through its standard input.
///
/// Closing stdin is the end-of-stream signal; the process is waited on
/// afterwards so it never outlives its handle as a zombie.
pub struct FfmpegProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    reaped: bool,
}

impl FfmpegProcess {
    /// Spawns `command` with a piped stdin.
    pub fn spawn(mut command: Command) -> std::io::Result<Self> {
        let mut child = command.stdin(Stdio::piped()).spawn()?;
        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            reaped: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn close_and_wait(&mut self) -> std::io::Result<ExitStatus> {
        drop(self.stdin.take());
        let status = self.child.wait();
        self.reaped = true;
        status
    }
}

impl EncoderProcess for FfmpegProcess {
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let stdin = self.stdin.as_mut().ok_or("encoder input already closed")?;
        stdin.write_all(bytes)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let status = self.close_and_wait()?;
        if !status.success() {
            return Err(format!("encoder exited with {status}").into());
        }
        Ok(())
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if !self.reaped {
            log::warn!("Encoder handle dropped while running, closing its input");
            if let Err(e) = self.close_and_wait() {
                log::error!("Failed to reap encoder process: {e}");
            }
        }
    }
}
