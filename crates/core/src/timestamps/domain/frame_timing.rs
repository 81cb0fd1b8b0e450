/// Cadence statistics derived from a recording's timestamp sequence.
///
/// The first timestamp is the session start; every later one marks a frame
/// delivered to the encoder. Comparing `effective_fps` with the rate declared
/// to the encoder shows how far the video's implied timeline drifts from
/// wall-clock time.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameTiming {
    pub frames: usize,
    pub duration: f64,
    pub mean_interval: f64,
    pub min_interval: f64,
    pub max_interval: f64,
}

impl FrameTiming {
    /// Returns `None` when fewer than two timestamps exist.
    pub fn from_timestamps(timestamps: &[f64]) -> Option<Self> {
        if timestamps.len() < 2 {
            return None;
        }

        let intervals: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        let duration = timestamps[timestamps.len() - 1] - timestamps[0];
        let min_interval = intervals.iter().copied().fold(f64::INFINITY, f64::min);
        let max_interval = intervals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            frames: intervals.len(),
            duration,
            mean_interval: duration / intervals.len() as f64,
            min_interval,
            max_interval,
        })
    }

    /// Frames per second actually delivered, or 0 for a zero-length session.
    pub fn effective_fps(&self) -> f64 {
        if self.duration > 0.0 {
            self.frames as f64 / self.duration
        } else {
            0.0
        }
    }

    /// Seconds the encoded video runs at `nominal_fps`.
    pub fn encoded_duration(&self, nominal_fps: u32) -> f64 {
        if nominal_fps == 0 {
            return 0.0;
        }
        self.frames as f64 / nominal_fps as f64
    }

    pub fn summary_string(&self, nominal_fps: u32) -> String {
        format!(
            "{} frames over {:.3}s (effective {:.1} fps, nominal {nominal_fps} fps; \
             interval avg {:.1}ms min {:.1}ms max {:.1}ms; video plays {:.3}s)",
            self.frames,
            self.duration,
            self.effective_fps(),
            self.mean_interval * 1000.0,
            self.min_interval * 1000.0,
            self.max_interval * 1000.0,
            self.encoded_duration(nominal_fps),
        )
    }
}
