//! Stream counters

use serde::Serialize;

/// Counters maintained by the buffer, snapshotted by [`RecordStream::stats`].
///
/// [`RecordStream::stats`]: crate::RecordStream::stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreamStats {
    /// Lines pushed by the source, blank lines included
    pub lines_received: u64,
    /// Blank lines dropped before parsing
    pub blank_lines: u64,
    /// Lines successfully decoded into records
    pub records_parsed: u64,
    /// Lines the model rejected
    pub malformed_lines: u64,
    /// Items handed to the consumer
    pub delivered: u64,
    /// Times the source was paused at capacity
    pub pauses: u64,
    /// Times a paused source was resumed
    pub resumes: u64,
    /// Highest buffer occupancy observed
    pub peak_buffered: usize,
}

impl StreamStats {
    pub(crate) fn observe_occupancy(&mut self, buffered: usize) {
        self.peak_buffered = self.peak_buffered.max(buffered);
    }

    /// Fraction of non-blank lines that failed to parse.
    pub fn malformed_ratio(&self) -> f64 {
        let parsed = self.records_parsed.saturating_add(self.malformed_lines);
        if parsed == 0 {
            return 0.0;
        }
        self.malformed_lines as f64 / parsed as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_maximum() {
        let mut stats = StreamStats::default();
        stats.observe_occupancy(3);
        stats.observe_occupancy(1);
        stats.observe_occupancy(5);
        stats.observe_occupancy(2);
        assert_eq!(stats.peak_buffered, 5);
    }

    #[test]
    fn test_malformed_ratio() {
        let mut stats = StreamStats::default();
        assert!(stats.malformed_ratio().abs() < f64::EPSILON);

        stats.records_parsed = 3;
        stats.malformed_lines = 1;
        assert!((stats.malformed_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
