/// Lifecycle position of a [`RecordingController`](super::recording_controller::RecordingController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Uninitialized,
    Initialized,
    Recording,
    /// A recording has been finalized. Behaves like `Initialized` for
    /// starting the next one.
    Closed,
}

impl RecordingState {
    pub fn can_start(self) -> bool {
        matches!(self, RecordingState::Initialized | RecordingState::Closed)
    }

    pub fn is_recording(self) -> bool {
        self == RecordingState::Recording
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Uninitialized => write!(f, "uninitialized"),
            RecordingState::Initialized => write!(f, "initialized"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Closed => write!(f, "closed"),
        }
    }
}
