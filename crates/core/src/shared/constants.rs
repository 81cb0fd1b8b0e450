/// Base name shared by every artifact a recording writes into its directory.
pub const VIDEO_BASENAME: &str = "world";
pub const VIDEO_EXTENSION: &str = "mp4";

pub const TIMESTAMPS_BASENAME: &str = "world_timestamps";
pub const TIMESTAMPS_EXTENSION: &str = "npy";

pub const SNAPSHOT_EXTENSION: &str = "png";

/// Rate declared to the encoder for the raw input stream. Actual delivery
/// follows the host's update cadence.
pub const NOMINAL_FPS: u32 = 60;

pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_CRF: u32 = 21;
pub const DEFAULT_PRESET: &str = "fast";
pub const DEFAULT_OUTPUT_PIXEL_FORMAT: &str = "yuv420p";
