use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::recording::host_hooks::HostHooks;
use crate::recording::recorder_error::RecorderError;
use crate::recording::recording_state::RecordingState;
use crate::shared::constants::NOMINAL_FPS;
use crate::shared::frame::Frame;
use crate::shared::recorder_settings::RecorderSettings;
use crate::shared::session_paths::{snapshot_path, SessionPaths};
use crate::shared::video_metadata::VideoMetadata;
use crate::timestamps::domain::frame_timing::FrameTiming;
use crate::timestamps::domain::timestamp_log::TimestampLog;
use crate::timestamps::domain::timestamp_store::TimestampStore;
use crate::timestamps::infrastructure::npy_timestamp_store::NpyTimestampStore;
use crate::video::domain::encoder_process::{EncoderLauncher, EncoderProcess};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::ffmpeg_process::FfmpegLauncher;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// Result of handing one frame to the recorder.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The frame reached the encoder and its timestamp was logged.
    Written,
    /// Nothing was recorded for this frame. The error has already been
    /// logged; the host can carry on with its frame loop.
    Failed(RecorderError),
}

impl FrameOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, FrameOutcome::Written)
    }
}

/// Records a host camera to `<dir>/world.mp4` through an external encoder,
/// logging each frame's capture time to `<dir>/world_timestamps.npy`.
///
/// The host drives everything: `init` binds the camera and directory,
/// `start_recording` opens the encoder, `update` captures one frame per
/// host frame, and `close` finalizes both outputs. Frames are never
/// buffered or dropped; `update` blocks if the encoder falls behind.
///
/// Every written frame gets exactly one timestamp, and the log also holds
/// the start timestamp, so a finished log is one longer than the number of
/// frames in the video.
pub struct RecordingController {
    launcher: Box<dyn EncoderLauncher>,
    image_writer: Box<dyn ImageWriter>,
    store: Box<dyn TimestampStore>,
    snapshot_dir: Option<PathBuf>,
    nominal_fps: u32,

    state: RecordingState,
    source: Option<Box<dyn FrameSource>>,
    staging: Option<Frame>,
    output_dir: Option<PathBuf>,
    encoder: Option<Box<dyn EncoderProcess>>,
    stream: Option<VideoMetadata>,
    timestamps: TimestampLog,
    snapshot_written: bool,
    frames_written: usize,
}

impl RecordingController {
    pub fn new(
        launcher: Box<dyn EncoderLauncher>,
        image_writer: Box<dyn ImageWriter>,
        store: Box<dyn TimestampStore>,
    ) -> Self {
        Self {
            launcher,
            image_writer,
            store,
            snapshot_dir: None,
            nominal_fps: NOMINAL_FPS,
            state: RecordingState::Uninitialized,
            source: None,
            staging: None,
            output_dir: None,
            encoder: None,
            stream: None,
            timestamps: TimestampLog::new(),
            snapshot_written: false,
            frames_written: 0,
        }
    }

    /// Wires the ffmpeg encoder, PNG snapshot writer and `.npy` store.
    pub fn from_settings(settings: &RecorderSettings) -> Self {
        Self::new(
            Box::new(FfmpegLauncher::new(settings.encoder.clone())),
            Box::new(ImageFileWriter::new().with_vertical_flip(settings.encoder.vertical_flip)),
            Box::new(NpyTimestampStore::new()),
        )
        .with_snapshot_dir(settings.snapshot_dir.clone())
        .with_nominal_fps(settings.encoder.fps)
    }

    /// Directory for the first-frame still. `None` means the working directory.
    pub fn with_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Rate the encoder is told to assume; used for the close summary.
    pub fn with_nominal_fps(mut self, fps: u32) -> Self {
        self.nominal_fps = fps;
        self
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.encoder.is_some()
    }

    /// Timestamps of the current recording, or of the last one after `close`.
    pub fn timestamps(&self) -> &[f64] {
        self.timestamps.as_slice()
    }

    /// Frames delivered to the encoder in the current or last recording.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Where the current directory's recording lands.
    pub fn session_paths(&self) -> Option<SessionPaths> {
        self.output_dir
            .as_deref()
            .map(SessionPaths::in_directory)
    }

    /// Binds a camera and an output directory.
    ///
    /// The directory must already exist and be writable. On failure the
    /// controller keeps its previous binding and state.
    pub fn init(
        &mut self,
        source: Option<Box<dyn FrameSource>>,
        output_dir: &Path,
    ) -> Result<(), RecorderError> {
        if self.state.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }
        let source = source.ok_or(RecorderError::FrameSourceUnavailable)?;
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            return Err(RecorderError::InvalidFrameSize { width, height });
        }
        validate_output_dir(output_dir)?;

        let format = source.pixel_format();
        log::info!(
            "Recorder bound to camera '{}' ({width}x{height} {format}), saving to {}",
            source.name(),
            output_dir.display()
        );

        self.staging = Some(Frame::blank(width, height, format));
        self.source = Some(source);
        self.output_dir = Some(output_dir.to_path_buf());
        self.state = RecordingState::Initialized;
        Ok(())
    }

    /// Launches the encoder and starts a fresh timestamp log seeded with
    /// `start_timestamp`.
    ///
    /// A recording already in progress is left untouched and reported as
    /// `AlreadyRecording`; close it first. Earlier output in the same
    /// directory is overwritten.
    pub fn start_recording(&mut self, start_timestamp: f64) -> Result<(), RecorderError> {
        if self.state.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }
        if !self.state.can_start() {
            return Err(RecorderError::NotInitialized(self.state));
        }
        let source = self
            .source
            .as_ref()
            .ok_or(RecorderError::NotInitialized(self.state))?;
        let dir = self
            .output_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or(RecorderError::OutputDirectoryUnset)?;

        let paths = SessionPaths::in_directory(dir);
        let metadata = VideoMetadata {
            width: source.width(),
            height: source.height(),
            fps: self.nominal_fps,
            pixel_format: source.pixel_format(),
        };
        let encoder = self
            .launcher
            .launch(&paths.video, &metadata)
            .map_err(|source| RecorderError::EncoderLaunch {
                path: paths.video.clone(),
                source,
            })?;

        self.encoder = Some(encoder);
        self.stream = Some(metadata);
        self.timestamps.restart(start_timestamp);
        self.snapshot_written = false;
        self.frames_written = 0;
        self.state = RecordingState::Recording;
        log::info!("Recording started: {}", paths.video.display());
        Ok(())
    }

    /// Captures the camera's current view and streams it to the encoder.
    ///
    /// Call once per host frame. Failures are logged and returned as
    /// `FrameOutcome::Failed` rather than propagated; a failed frame gets
    /// no timestamp.
    pub fn update(&mut self, frame_timestamp: f64) -> FrameOutcome {
        match self.capture_frame(frame_timestamp) {
            Ok(()) => {
                log::trace!("Frame {} at {frame_timestamp}", self.frames_written);
                FrameOutcome::Written
            }
            Err(e) => {
                log::error!("Frame at {frame_timestamp} not recorded: {e}");
                FrameOutcome::Failed(e)
            }
        }
    }

    fn capture_frame(&mut self, frame_timestamp: f64) -> Result<(), RecorderError> {
        let encoder = self.encoder.as_mut().ok_or(RecorderError::NotRecording)?;
        let source = self.source.as_mut().ok_or(RecorderError::NotRecording)?;
        let staging = self.staging.as_mut().ok_or(RecorderError::NotRecording)?;
        let stream = self.stream.as_ref().ok_or(RecorderError::NotRecording)?;

        source
            .render_current_view()
            .map_err(RecorderError::Render)?;
        source
            .copy_rendered_pixels_into(staging)
            .map_err(RecorderError::Render)?;

        // The encoder was told the stream's shape at launch.
        let expected = stream.frame_bytes();
        if staging.data().len() != expected {
            return Err(RecorderError::FrameSize {
                expected,
                actual: staging.data().len(),
            });
        }
        encoder
            .write_frame(staging.data())
            .map_err(RecorderError::EncoderWrite)?;

        self.timestamps.push(frame_timestamp);
        self.frames_written += 1;

        if !self.snapshot_written {
            self.snapshot_written = true;
            self.write_snapshot();
        }
        Ok(())
    }

    fn write_snapshot(&self) {
        let (Some(source), Some(staging)) = (self.source.as_ref(), self.staging.as_ref()) else {
            return;
        };
        let path = snapshot_path(self.snapshot_dir.as_deref(), source.name());
        match self.image_writer.write(&path, staging) {
            Ok(()) => log::info!("First frame saved to {}", path.display()),
            Err(e) => log::warn!("Failed to save first frame to {}: {e}", path.display()),
        }
    }

    /// Finalizes the current recording: closes the encoder's input, waits
    /// for it to exit, then persists the timestamp log.
    ///
    /// The encoder is always released, even when persisting fails. The
    /// returned result reflects only the timestamp write; an encoder that
    /// exits with an error is logged. Without an active recording this is
    /// a successful no-op.
    pub fn close(&mut self) -> Result<(), RecorderError> {
        let Some(encoder) = self.encoder.take() else {
            log::debug!("Close requested with no active recording");
            return Ok(());
        };
        self.stream = None;

        match encoder.finish() {
            Ok(()) => log::info!("Encoder finished ({} frames)", self.frames_written),
            Err(e) => log::error!("Encoder did not finish cleanly: {e}"),
        }
        self.state = RecordingState::Closed;

        if let Some(timing) = FrameTiming::from_timestamps(self.timestamps.as_slice()) {
            log::info!("Recording summary: {}", timing.summary_string(self.nominal_fps));
        }

        let paths = self
            .session_paths()
            .ok_or(RecorderError::OutputDirectoryUnset)?;
        self.store
            .persist(&paths.timestamps, self.timestamps.as_slice())?;
        log::info!(
            "Saved {} timestamps to {}",
            self.timestamps.len(),
            paths.timestamps.display()
        );
        Ok(())
    }
}

impl HostHooks for RecordingController {}

impl Drop for RecordingController {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            log::warn!("Recorder dropped while recording, finalizing");
            if let Err(e) = self.close() {
                log::error!("Failed to finalize recording: {e}");
            }
        }
    }
}

fn validate_output_dir(dir: &Path) -> Result<(), RecorderError> {
    let unusable = |reason: String| RecorderError::OutputDirectory {
        path: dir.to_path_buf(),
        reason,
    };
    if dir.as_os_str().is_empty() {
        return Err(unusable("path is empty".to_string()));
    }
    let metadata = fs::metadata(dir).map_err(|e| unusable(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(unusable("not a directory".to_string()));
    }
    tempfile::tempfile_in(dir).map_err(|e| unusable(format!("not writable: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::pixel_format::PixelFormat;
    use crate::timestamps::domain::timestamp_store::TimestampStoreError;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubSource {
        name: String,
        width: u32,
        height: u32,
        format: PixelFormat,
        renders: Arc<Mutex<usize>>,
        fail_renders: Arc<Mutex<usize>>,
    }

    impl FrameSource for StubSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn pixel_format(&self) -> PixelFormat {
            self.format
        }

        fn render_current_view(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            let mut failing = self.fail_renders.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err("render target lost".into());
            }
            *self.renders.lock().unwrap() += 1;
            Ok(())
        }

        fn copy_rendered_pixels_into(
            &mut self,
            image: &mut Frame,
        ) -> Result<(), Box<dyn std::error::Error>> {
            let fill = *self.renders.lock().unwrap() as u8;
            image.data_mut().fill(fill);
            Ok(())
        }
    }

    struct StubEncoder {
        writes: Arc<Mutex<Vec<usize>>>,
        finished: Arc<Mutex<usize>>,
        fail_writes: bool,
        fail_finish: bool,
    }

    impl EncoderProcess for StubEncoder {
        fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_writes {
                return Err("broken pipe".into());
            }
            self.writes.lock().unwrap().push(bytes.len());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<(), Box<dyn std::error::Error>> {
            *self.finished.lock().unwrap() += 1;
            if self.fail_finish {
                return Err("encoder exited with exit status: 1".into());
            }
            Ok(())
        }
    }

    struct StubLauncher {
        launches: Arc<Mutex<Vec<(PathBuf, VideoMetadata)>>>,
        writes: Arc<Mutex<Vec<usize>>>,
        finished: Arc<Mutex<usize>>,
        fail_launch: bool,
        fail_writes: bool,
        fail_finish: bool,
    }

    impl EncoderLauncher for StubLauncher {
        fn launch(
            &self,
            output: &Path,
            metadata: &VideoMetadata,
        ) -> Result<Box<dyn EncoderProcess>, Box<dyn std::error::Error>> {
            if self.fail_launch {
                return Err("ffmpeg: command not found".into());
            }
            self.launches
                .lock()
                .unwrap()
                .push((output.to_path_buf(), metadata.clone()));
            Ok(Box::new(StubEncoder {
                writes: self.writes.clone(),
                finished: self.finished.clone(),
                fail_writes: self.fail_writes,
                fail_finish: self.fail_finish,
            }))
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.data().to_vec()));
            Ok(())
        }
    }

    #[allow(clippy::type_complexity)]
    struct StubStore {
        persisted: Arc<Mutex<Vec<(PathBuf, Vec<f64>)>>>,
        fail: bool,
    }

    impl TimestampStore for StubStore {
        fn persist(&self, path: &Path, timestamps: &[f64]) -> Result<(), TimestampStoreError> {
            if self.fail {
                return Err(TimestampStoreError::Write {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.persisted
                .lock()
                .unwrap()
                .push((path.to_path_buf(), timestamps.to_vec()));
            Ok(())
        }
    }

    // --- Helpers ---

    /// Shared views into everything the stubs record.
    #[derive(Default)]
    #[allow(clippy::type_complexity)]
    struct Seen {
        renders: Arc<Mutex<usize>>,
        fail_renders: Arc<Mutex<usize>>,
        launches: Arc<Mutex<Vec<(PathBuf, VideoMetadata)>>>,
        writes: Arc<Mutex<Vec<usize>>>,
        finished: Arc<Mutex<usize>>,
        stills: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
        persisted: Arc<Mutex<Vec<(PathBuf, Vec<f64>)>>>,
    }

    #[derive(Default)]
    struct Faults {
        launch: bool,
        writes: bool,
        finish: bool,
        persist: bool,
    }

    fn controller(seen: &Seen, faults: Faults) -> RecordingController {
        RecordingController::new(
            Box::new(StubLauncher {
                launches: seen.launches.clone(),
                writes: seen.writes.clone(),
                finished: seen.finished.clone(),
                fail_launch: faults.launch,
                fail_writes: faults.writes,
                fail_finish: faults.finish,
            }),
            Box::new(StubImageWriter {
                written: seen.stills.clone(),
            }),
            Box::new(StubStore {
                persisted: seen.persisted.clone(),
                fail: faults.persist,
            }),
        )
    }

    fn source(seen: &Seen, width: u32, height: u32, format: PixelFormat) -> Box<dyn FrameSource> {
        Box::new(StubSource {
            name: "main_camera".to_string(),
            width,
            height,
            format,
            renders: seen.renders.clone(),
            fail_renders: seen.fail_renders.clone(),
        })
    }

    /// Controller bound to a 640x480 RGBA camera and a fresh directory.
    fn initialized(seen: &Seen, faults: Faults) -> (RecordingController, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = controller(seen, faults);
        rec.init(Some(source(seen, 640, 480, PixelFormat::Rgba)), dir.path())
            .unwrap();
        (rec, dir)
    }

    // --- Full session ---

    #[test]
    fn test_three_frame_session() {
        let seen = Seen::default();
        let (mut rec, dir) = initialized(&seen, Faults::default());

        rec.start_recording(0.0).unwrap();
        for t in [0.016, 0.032, 0.048] {
            assert!(rec.update(t).is_written());
        }
        rec.close().unwrap();

        assert_eq!(rec.timestamps(), &[0.0, 0.016, 0.032, 0.048]);
        assert_eq!(rec.state(), RecordingState::Closed);

        let launches = seen.launches.lock().unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].0, dir.path().join("world.mp4"));
        assert_eq!(launches[0].1.fps, 60);
        assert_eq!(launches[0].1.pixel_format, PixelFormat::Rgba);

        assert_eq!(*seen.writes.lock().unwrap(), vec![640 * 480 * 4; 3]);
        assert_eq!(*seen.finished.lock().unwrap(), 1);

        let stills = seen.stills.lock().unwrap();
        assert_eq!(stills.len(), 1);
        assert_eq!(stills[0].0, PathBuf::from("main_camera.png"));

        let persisted = seen.persisted.lock().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].0, dir.path().join("world_timestamps.npy"));
        assert_eq!(persisted[0].1, vec![0.0, 0.016, 0.032, 0.048]);
    }

    #[test]
    fn test_log_length_is_updates_plus_one() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());

        rec.start_recording(5.0).unwrap();
        for i in 1..=25 {
            rec.update(5.0 + i as f64 / 60.0);
        }
        rec.close().unwrap();

        assert_eq!(rec.timestamps().len(), 26);
        assert_eq!(rec.frames_written(), 25);
        assert_eq!(seen.writes.lock().unwrap().len(), 25);
    }

    #[test]
    fn test_snapshot_comes_from_first_frame() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        let snapshot_dir = PathBuf::from("/tmp/stills");
        rec = rec.with_snapshot_dir(Some(snapshot_dir.clone()));
        // Builder consumed the bound controller; it keeps its binding.
        assert_eq!(rec.state(), RecordingState::Initialized);

        rec.start_recording(0.0).unwrap();
        rec.update(0.1);
        rec.update(0.2);
        rec.close().unwrap();

        let stills = seen.stills.lock().unwrap();
        assert_eq!(stills.len(), 1);
        assert_eq!(stills[0].0, snapshot_dir.join("main_camera.png"));
        // The stub fills the frame with the render count.
        assert!(stills[0].1.iter().all(|&b| b == 1));
    }

    #[rstest]
    #[case::rgba(PixelFormat::Rgba, 4)]
    #[case::rgb(PixelFormat::Rgb, 3)]
    fn test_each_update_writes_one_whole_frame(#[case] format: PixelFormat, #[case] bpp: usize) {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let mut rec = controller(&seen, Faults::default());
        rec.init(Some(source(&seen, 33, 17, format)), dir.path())
            .unwrap();

        rec.start_recording(0.0).unwrap();
        rec.update(0.5);
        rec.update(1.0);
        rec.close().unwrap();

        assert_eq!(*seen.writes.lock().unwrap(), vec![bpp * 33 * 17; 2]);
    }

    // --- Close ---

    #[test]
    fn test_close_without_recording_is_noop() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());

        rec.close().unwrap();

        assert!(seen.persisted.lock().unwrap().is_empty());
        assert_eq!(*seen.finished.lock().unwrap(), 0);
        assert_eq!(rec.state(), RecordingState::Initialized);
    }

    #[test]
    fn test_close_before_init_is_noop() {
        let seen = Seen::default();
        let mut rec = controller(&seen, Faults::default());
        rec.close().unwrap();
        assert_eq!(rec.state(), RecordingState::Uninitialized);
        assert!(seen.persisted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_twice_persists_once() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();
        rec.close().unwrap();
        rec.close().unwrap();
        assert_eq!(seen.persisted.lock().unwrap().len(), 1);
        assert_eq!(*seen.finished.lock().unwrap(), 1);
    }

    #[test]
    fn test_persist_failure_still_releases_encoder() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(
            &seen,
            Faults {
                persist: true,
                ..Default::default()
            },
        );
        rec.start_recording(0.0).unwrap();
        rec.update(0.016);

        let result = rec.close();

        assert!(matches!(result, Err(RecorderError::Persist(_))));
        assert_eq!(*seen.finished.lock().unwrap(), 1);
        assert!(!rec.is_recording());
        assert_eq!(rec.state(), RecordingState::Closed);
    }

    #[test]
    fn test_encoder_exit_failure_does_not_fail_close() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(
            &seen,
            Faults {
                finish: true,
                ..Default::default()
            },
        );
        rec.start_recording(0.0).unwrap();
        rec.update(0.016);

        rec.close().unwrap();
        assert_eq!(seen.persisted.lock().unwrap()[0].1, vec![0.0, 0.016]);
    }

    #[test]
    fn test_drop_while_recording_finalizes() {
        let seen = Seen::default();
        {
            let (mut rec, _dir) = initialized(&seen, Faults::default());
            rec.start_recording(1.0).unwrap();
            rec.update(1.5);
        }
        assert_eq!(*seen.finished.lock().unwrap(), 1);
        assert_eq!(seen.persisted.lock().unwrap()[0].1, vec![1.0, 1.5]);
    }

    // --- Restart ---

    #[test]
    fn test_restart_after_close_resets_session() {
        let seen = Seen::default();
        let (mut rec, dir) = initialized(&seen, Faults::default());

        rec.start_recording(0.0).unwrap();
        rec.update(0.016);
        rec.update(0.032);
        rec.close().unwrap();
        assert!(!rec.is_recording());

        rec.start_recording(10.0).unwrap();
        assert_eq!(rec.state(), RecordingState::Recording);
        assert_eq!(rec.timestamps(), &[10.0]);
        rec.update(10.016);
        rec.close().unwrap();

        let persisted = seen.persisted.lock().unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[1].1, vec![10.0, 10.016]);
        // Same directory, same paths: the second recording replaces the first.
        assert_eq!(persisted[0].0, persisted[1].0);
        let launches = seen.launches.lock().unwrap();
        assert_eq!(launches.len(), 2);
        assert_eq!(launches[1].0, dir.path().join("world.mp4"));
        // Each session writes its own first-frame still.
        assert_eq!(seen.stills.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_second_start_without_close_is_rejected() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());

        rec.start_recording(0.0).unwrap();
        rec.update(0.016);
        let result = rec.start_recording(1.0);

        assert!(matches!(result, Err(RecorderError::AlreadyRecording)));
        assert_eq!(rec.state(), RecordingState::Recording);
        assert_eq!(rec.timestamps(), &[0.0, 0.016]);
        assert_eq!(seen.launches.lock().unwrap().len(), 1);
        assert!(rec.update(0.032).is_written());
    }

    // --- Start failures ---

    #[test]
    fn test_start_before_init_fails() {
        let seen = Seen::default();
        let mut rec = controller(&seen, Faults::default());

        let result = rec.start_recording(0.0);

        assert!(matches!(
            result,
            Err(RecorderError::NotInitialized(RecordingState::Uninitialized))
        ));
        assert!(seen.launches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_launch_failure_leaves_state_unchanged() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(
            &seen,
            Faults {
                launch: true,
                ..Default::default()
            },
        );

        let result = rec.start_recording(0.0);

        assert!(matches!(result, Err(RecorderError::EncoderLaunch { .. })));
        assert_eq!(rec.state(), RecordingState::Initialized);
        assert!(!rec.is_recording());
        assert!(rec.timestamps().is_empty());
        assert!(!rec.update(0.016).is_written());
    }

    // --- Update outside recording ---

    #[test]
    fn test_update_before_init_reports_not_recording() {
        let seen = Seen::default();
        let mut rec = controller(&seen, Faults::default());
        assert!(matches!(
            rec.update(0.016),
            FrameOutcome::Failed(RecorderError::NotRecording)
        ));
        assert!(rec.timestamps().is_empty());
    }

    #[test]
    fn test_update_after_close_does_not_touch_log() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();
        rec.update(0.016);
        rec.close().unwrap();

        let outcome = rec.update(0.032);

        assert!(matches!(outcome, FrameOutcome::Failed(RecorderError::NotRecording)));
        assert_eq!(rec.timestamps(), &[0.0, 0.016]);
        assert_eq!(seen.writes.lock().unwrap().len(), 1);
        assert_eq!(*seen.renders.lock().unwrap(), 1);
    }

    #[test]
    fn test_update_while_initialized_renders_nothing() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        assert!(!rec.update(0.016).is_written());
        assert_eq!(*seen.renders.lock().unwrap(), 0);
    }

    // --- Per-frame failures ---

    #[test]
    fn test_render_failure_skips_frame_and_timestamp() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();
        *seen.fail_renders.lock().unwrap() = 1;

        let outcome = rec.update(0.016);
        assert!(matches!(outcome, FrameOutcome::Failed(RecorderError::Render(_))));
        assert!(seen.stills.lock().unwrap().is_empty());

        assert!(rec.update(0.032).is_written());
        rec.close().unwrap();

        assert_eq!(rec.timestamps(), &[0.0, 0.032]);
        assert_eq!(seen.writes.lock().unwrap().len(), 1);
        // The still comes from the first frame that actually succeeded.
        assert_eq!(seen.stills.lock().unwrap().len(), 1);
    }

    struct ResizingSource {
        width: Arc<Mutex<u32>>,
    }

    impl FrameSource for ResizingSource {
        fn name(&self) -> &str {
            "resizing_camera"
        }

        fn width(&self) -> u32 {
            *self.width.lock().unwrap()
        }

        fn height(&self) -> u32 {
            64
        }

        fn render_current_view(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn copy_rendered_pixels_into(
            &mut self,
            image: &mut Frame,
        ) -> Result<(), Box<dyn std::error::Error>> {
            image.data_mut().fill(9);
            Ok(())
        }
    }

    #[test]
    fn test_source_resized_after_init_skips_frame() {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let width = Arc::new(Mutex::new(64));
        let mut rec = controller(&seen, Faults::default());
        rec.init(
            Some(Box::new(ResizingSource {
                width: width.clone(),
            })),
            dir.path(),
        )
        .unwrap();

        // The encoder is launched for the new size; staging still holds the old one.
        *width.lock().unwrap() = 32;
        rec.start_recording(0.0).unwrap();
        assert_eq!(seen.launches.lock().unwrap()[0].1.width, 32);

        let outcome = rec.update(0.016);

        assert!(matches!(
            outcome,
            FrameOutcome::Failed(RecorderError::FrameSize {
                expected: 8192,
                actual: 16384
            })
        ));
        assert!(seen.writes.lock().unwrap().is_empty());
        assert!(seen.stills.lock().unwrap().is_empty());
        assert_eq!(rec.timestamps(), &[0.0]);
    }

    #[test]
    fn test_encoder_write_failure_skips_timestamp() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(
            &seen,
            Faults {
                writes: true,
                ..Default::default()
            },
        );
        rec.start_recording(0.0).unwrap();

        let outcome = rec.update(0.016);

        assert!(matches!(outcome, FrameOutcome::Failed(RecorderError::EncoderWrite(_))));
        assert!(rec.is_recording());
        assert_eq!(rec.timestamps(), &[0.0]);
        rec.close().unwrap();
        assert_eq!(seen.persisted.lock().unwrap()[0].1, vec![0.0]);
    }

    // --- Init ---

    #[test]
    fn test_init_without_source_fails() {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let mut rec = controller(&seen, Faults::default());

        let result = rec.init(None, dir.path());

        assert!(matches!(result, Err(RecorderError::FrameSourceUnavailable)));
        assert_eq!(rec.state(), RecordingState::Uninitialized);
    }

    #[test]
    fn test_init_with_empty_frame_fails() {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let mut rec = controller(&seen, Faults::default());

        let result = rec.init(Some(source(&seen, 0, 480, PixelFormat::Rgba)), dir.path());

        assert!(matches!(
            result,
            Err(RecorderError::InvalidFrameSize {
                width: 0,
                height: 480
            })
        ));
    }

    #[test]
    fn test_init_with_missing_directory_fails() {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not_there");
        let mut rec = controller(&seen, Faults::default());

        let result = rec.init(Some(source(&seen, 64, 64, PixelFormat::Rgba)), &missing);

        assert!(matches!(result, Err(RecorderError::OutputDirectory { .. })));
        assert_eq!(rec.state(), RecordingState::Uninitialized);
        assert!(rec.output_dir().is_none());
    }

    #[test]
    fn test_init_with_file_path_fails() {
        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();
        let mut rec = controller(&seen, Faults::default());

        let err = rec
            .init(Some(source(&seen, 64, 64, PixelFormat::Rgba)), &file)
            .unwrap_err();

        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_init_with_empty_path_fails() {
        let seen = Seen::default();
        let mut rec = controller(&seen, Faults::default());
        let err = rec
            .init(Some(source(&seen, 64, 64, PixelFormat::Rgba)), Path::new(""))
            .unwrap_err();
        assert!(err.to_string().contains("path is empty"));
    }

    #[cfg(unix)]
    #[test]
    fn test_init_requires_write_access() {
        use std::os::unix::fs::PermissionsExt;

        let seen = Seen::default();
        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users can write regardless of mode bits.
        let writable = fs::write(locked.join("check"), b"x").is_ok();
        let _ = fs::remove_file(locked.join("check"));
        let mut rec = controller(&seen, Faults::default());

        let result = rec.init(Some(source(&seen, 64, 64, PixelFormat::Rgba)), &locked);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if writable {
            assert!(result.is_ok());
            assert_eq!(rec.state(), RecordingState::Initialized);
        } else {
            let err = result.unwrap_err();
            assert!(matches!(err, RecorderError::OutputDirectory { .. }));
            assert!(err.to_string().contains("not writable"));
            assert_eq!(rec.state(), RecordingState::Uninitialized);
        }
        // The write check leaves nothing behind.
        assert_eq!(fs::read_dir(&locked).unwrap().count(), 0);
    }

    #[test]
    fn test_init_in_writable_directory_leaves_it_empty() {
        let seen = Seen::default();
        let (_rec, dir) = initialized(&seen, Faults::default());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_init_while_recording_is_rejected() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();
        let other = tempfile::tempdir().unwrap();

        let result = rec.init(Some(source(&seen, 32, 32, PixelFormat::Rgba)), other.path());

        assert!(matches!(result, Err(RecorderError::AlreadyRecording)));
        assert!(rec.update(0.016).is_written());
        assert_eq!(*seen.writes.lock().unwrap(), vec![640 * 480 * 4]);
    }

    #[test]
    fn test_rebind_after_close_uses_new_directory() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();
        rec.close().unwrap();

        let other = tempfile::tempdir().unwrap();
        rec.init(Some(source(&seen, 32, 32, PixelFormat::Rgba)), other.path())
            .unwrap();
        rec.start_recording(1.0).unwrap();

        let launches = seen.launches.lock().unwrap();
        assert_eq!(launches[1].0, other.path().join("world.mp4"));
        assert_eq!(launches[1].1.width, 32);
    }

    // --- Host hooks ---

    #[test]
    fn test_host_hooks_have_no_effect() {
        let seen = Seen::default();
        let (mut rec, _dir) = initialized(&seen, Faults::default());
        rec.start_recording(0.0).unwrap();

        rec.keyboard_update(65, 38, 1, 0);
        rec.mouse_buttons_update(0, 1, 0);
        rec.mouse_position_update(120.0, 80.0);
        rec.mouse_scroll_update(0.0, -1.0);
        rec.physics_update(0.001);
        rec.reset();

        assert_eq!(rec.state(), RecordingState::Recording);
        assert_eq!(rec.timestamps(), &[0.0]);
        assert_eq!(*seen.renders.lock().unwrap(), 0);
        assert!(seen.writes.lock().unwrap().is_empty());
    }

    // --- With real file outputs ---

    #[test]
    fn test_session_writes_npy_and_png() {
        let seen = Seen::default();
        let out = tempfile::tempdir().unwrap();
        let stills = tempfile::tempdir().unwrap();
        let mut rec = RecordingController::new(
            Box::new(StubLauncher {
                launches: seen.launches.clone(),
                writes: seen.writes.clone(),
                finished: seen.finished.clone(),
                fail_launch: false,
                fail_writes: false,
                fail_finish: false,
            }),
            Box::new(ImageFileWriter::new()),
            Box::new(NpyTimestampStore::new()),
        )
        .with_snapshot_dir(Some(stills.path().to_path_buf()));

        rec.init(Some(source(&seen, 16, 12, PixelFormat::Rgba)), out.path())
            .unwrap();
        rec.start_recording(0.0).unwrap();
        for t in [0.016, 0.032, 0.048] {
            rec.update(t);
        }
        rec.close().unwrap();

        let loaded = NpyTimestampStore::load(&out.path().join("world_timestamps.npy")).unwrap();
        assert_eq!(loaded.to_vec(), vec![0.0, 0.016, 0.032, 0.048]);

        let still = image::open(stills.path().join("main_camera.png")).unwrap();
        assert_eq!((still.width(), still.height()), (16, 12));
    }
}
