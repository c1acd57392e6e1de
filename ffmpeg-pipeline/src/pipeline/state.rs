use crate::scaler::LazyScaler;

/// Run-scoped state of the images -> video pipeline.
///
/// The pts counter starts at 0 and advances once per frame fed in the main
/// loop and once per packet flushed while draining.
pub struct PipelineState {
    pts: i64,
    draining: bool,
    scaler: LazyScaler,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            pts: 0,
            draining: false,
            scaler: LazyScaler::new(),
        }
    }

    /// Current counter value, i.e. the pts the next frame will get.
    pub fn pts(&self) -> i64 {
        self.pts
    }

    /// Hands out the next frame pts.
    pub fn next_pts(&mut self) -> i64 {
        let pts = self.pts;
        self.pts += 1;
        pts
    }

    /// Counts one packet flushed during the drain phase.
    pub fn count_drained_packet(&mut self) {
        self.pts += 1;
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn start_drain(&mut self) {
        self.draining = true;
    }

    pub fn scaler_mut(&mut self) -> &mut LazyScaler {
        &mut self.scaler
    }

    pub fn scaler(&self) -> &LazyScaler {
        &self.scaler
    }
}

/// Sequence numbers for still images written by the video -> images pipeline.
#[derive(Debug, Default)]
pub struct WriterState {
    sequence: usize,
}

impl WriterState {
    pub fn new() -> Self {
        Self { sequence: 0 }
    }

    pub fn next_sequence(&mut self) -> usize {
        let n = self.sequence;
        self.sequence += 1;
        n
    }

    /// Number of sequence numbers handed out so far.
    pub fn written(&self) -> usize {
        self.sequence
    }
}
