use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters collected over one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub direction: String,
    pub source: String,
    pub destination: String,
    /// Source images consumed (images -> video) or 1 (video -> images).
    pub inputs: usize,
    pub frames_decoded: usize,
    pub frames_encoded: usize,
    /// Packets written during the main loop.
    pub packets_written: usize,
    /// Packets written while flushing the encoder.
    pub packets_drained: usize,
    pub images_written: usize,
    /// Value of the pts counter when the run ended.
    pub final_pts: i64,
    pub elapsed_ms: u128,
}

impl RunReport {
    pub fn new(direction: &str, source: impl fmt::Display, destination: impl fmt::Display) -> Self {
        Self {
            direction: direction.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    pub fn finish(&mut self, started: Instant) {
        self.elapsed_ms = started.elapsed().as_millis();
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.min(u64::MAX as u128) as u64)
    }

    /// Frames that left the pipeline: encoded frames or written images.
    pub fn frames_out(&self) -> usize {
        self.frames_encoded.max(self.images_written)
    }

    pub fn total_packets(&self) -> usize {
        self.packets_written + self.packets_drained
    }

    pub fn avg_fps(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.frames_out() as f64 * 1000.0 / self.elapsed_ms as f64
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished in {:.2?}, avg {:.2} fps",
            self.elapsed(),
            self.avg_fps()
        )
    }
}
