use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use sim_recorder_core::capture::domain::frame_source::FrameSource;
use sim_recorder_core::capture::infrastructure::test_pattern_source::TestPatternSource;
use sim_recorder_core::recording::recording_controller::RecordingController;
use sim_recorder_core::shared::constants::NOMINAL_FPS;
use sim_recorder_core::shared::pixel_format::PixelFormat;
use sim_recorder_core::shared::recorder_settings::RecorderSettings;
use sim_recorder_core::timestamps::domain::frame_timing::FrameTiming;
use sim_recorder_core::timestamps::infrastructure::npy_timestamp_store::NpyTimestampStore;

/// Records a simulated camera to video with per-frame timestamps.
#[derive(Parser)]
#[command(name = "sim-recorder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive a test-pattern camera through one recording session.
    Record(RecordArgs),
    /// Print cadence statistics for a recorded timestamp file.
    Inspect {
        /// Path to a world_timestamps.npy file.
        timestamps: PathBuf,

        /// Rate the video was encoded at.
        #[arg(long, default_value_t = NOMINAL_FPS)]
        nominal_fps: u32,
    },
}

#[derive(Args)]
struct RecordArgs {
    /// Existing directory that receives world.mp4 and world_timestamps.npy.
    output_dir: PathBuf,

    /// JSON settings file; flags below override its values.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value = "640")]
    width: u32,

    #[arg(long, default_value = "480")]
    height: u32,

    /// Pixel layout of the simulated camera: rgba or rgb.
    #[arg(long, default_value = "rgba")]
    pixel_format: String,

    /// Camera name; the first frame is saved as <camera>.png.
    #[arg(long, default_value = "main_camera")]
    camera: String,

    /// Number of frames to capture after the start timestamp.
    #[arg(long, default_value = "180")]
    frames: usize,

    /// Host frame rate to simulate (frames per second).
    #[arg(long, default_value = "60")]
    rate: f64,

    /// Path to the ffmpeg binary.
    #[arg(long)]
    ffmpeg: Option<String>,

    /// H.264 CRF quality (0=lossless, 51=worst, default 21).
    #[arg(long)]
    crf: Option<u32>,

    /// Directory for the first-frame still (default: working directory).
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Record(args) => run_record(args),
        Command::Inspect {
            timestamps,
            nominal_fps,
        } => run_inspect(&timestamps, nominal_fps),
    }
}

fn run_record(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    let interval = frame_interval(args.rate)?;
    // Reject schedules that cannot finish before anything is opened.
    frame_due(interval, args.frames)?;
    let format = parse_pixel_format(&args.pixel_format)?;

    let source: Box<dyn FrameSource> = Box::new(TestPatternSource::with_format(
        args.camera,
        args.width,
        args.height,
        format,
    ));
    let mut recorder = RecordingController::from_settings(&settings);
    recorder.init(Some(source), &args.output_dir)?;

    let clock = Instant::now();
    recorder.start_recording(0.0)?;

    let mut failed = 0usize;
    for i in 1..=args.frames {
        let due = frame_due(interval, i)?;
        if let Some(wait) = due.checked_sub(clock.elapsed()) {
            thread::sleep(wait);
        }
        if !recorder.update(clock.elapsed().as_secs_f64()).is_written() {
            failed += 1;
        }
        if i % 60 == 0 || i == args.frames {
            eprint!("\rRecorded frame {i}/{}", args.frames);
        }
    }
    eprintln!();

    recorder.close()?;
    if failed > 0 {
        log::warn!("{failed} of {} frames were not recorded", args.frames);
    }
    if let Some(paths) = recorder.session_paths() {
        log::info!("Video written to {}", paths.video.display());
        log::info!("Timestamps written to {}", paths.timestamps.display());
    }
    print_timing(recorder.timestamps(), settings.encoder.fps);
    Ok(())
}

/// Wall-clock spacing between simulated host frames.
fn frame_interval(rate: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(format!("--rate must be a positive number, got {rate}").into());
    }
    Duration::try_from_secs_f64(1.0 / rate)
        .map_err(|e| format!("--rate {rate} gives no usable frame interval: {e}").into())
}

/// Offset of frame `index` from the start of the recording.
fn frame_due(interval: Duration, index: usize) -> Result<Duration, Box<dyn std::error::Error>> {
    u32::try_from(index)
        .ok()
        .and_then(|n| interval.checked_mul(n))
        .ok_or_else(|| format!("frame {index} is scheduled beyond the representable time range").into())
}

fn run_inspect(path: &Path, nominal_fps: u32) -> Result<(), Box<dyn std::error::Error>> {
    let timestamps = NpyTimestampStore::load(path)?.to_vec();
    println!("{}: {} timestamps", path.display(), timestamps.len());
    if let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) {
        println!("  start {first:.6}  end {last:.6}");
    }
    print_timing(&timestamps, nominal_fps);
    Ok(())
}

fn print_timing(timestamps: &[f64], nominal_fps: u32) {
    match FrameTiming::from_timestamps(timestamps) {
        Some(timing) => println!("  {}", timing.summary_string(nominal_fps)),
        None => println!("  no frames recorded"),
    }
}

fn build_settings(args: &RecordArgs) -> Result<RecorderSettings, Box<dyn std::error::Error>> {
    let mut settings = match &args.settings {
        Some(path) => RecorderSettings::load(path)?,
        None => RecorderSettings::default(),
    };
    if let Some(ffmpeg) = &args.ffmpeg {
        settings.encoder.ffmpeg_path = ffmpeg.clone();
    }
    if let Some(crf) = args.crf {
        settings.encoder.crf = crf;
    }
    if args.snapshot_dir.is_some() {
        settings.snapshot_dir = args.snapshot_dir.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn parse_pixel_format(s: &str) -> Result<PixelFormat, Box<dyn std::error::Error>> {
    match s {
        "rgba" => Ok(PixelFormat::Rgba),
        "rgb" => Ok(PixelFormat::Rgb),
        other => Err(format!("unknown pixel format '{other}' (expected rgba or rgb)").into()),
    }
}
