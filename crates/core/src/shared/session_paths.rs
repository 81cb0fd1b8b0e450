use std::path::{Path, PathBuf};

use crate::shared::constants::{
    SNAPSHOT_EXTENSION, TIMESTAMPS_BASENAME, TIMESTAMPS_EXTENSION, VIDEO_BASENAME,
    VIDEO_EXTENSION,
};

/// Output locations of one recording, derived from its directory alone.
///
/// Two recordings into the same directory resolve to the same paths, so the
/// later one replaces the earlier one's files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPaths {
    pub video: PathBuf,
    pub timestamps: PathBuf,
}

impl SessionPaths {
    pub fn in_directory(dir: &Path) -> Self {
        Self {
            video: dir.join(format!("{VIDEO_BASENAME}.{VIDEO_EXTENSION}")),
            timestamps: dir.join(format!("{TIMESTAMPS_BASENAME}.{TIMESTAMPS_EXTENSION}")),
        }
    }
}

/// Path of the first-frame still for a camera.
pub fn snapshot_path(dir: Option<&Path>, camera_name: &str) -> PathBuf {
    let file_name = format!("{camera_name}.{SNAPSHOT_EXTENSION}");
    match dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
