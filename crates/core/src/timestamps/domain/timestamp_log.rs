/// Append-only capture times for one recording, in capture order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimestampLog {
    entries: Vec<f64>,
}

impl TimestampLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the log and seeds it with the session's start time.
    pub fn restart(&mut self, start: f64) {
        self.entries.clear();
        self.entries.push(start);
    }

    pub fn push(&mut self, timestamp: f64) {
        self.entries.push(timestamp);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.entries
    }
}
