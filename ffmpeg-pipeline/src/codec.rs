use crate::error::PipelineError;

/// Lifecycle shared by decoders and encoders.
///
/// `Open -> Running` on the first unit fed, `-> Draining` on the first
/// end-of-input request, `-> Closed` once the codec reports end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
    Open,
    Running,
    Draining,
    Closed,
}

impl CodecState {
    /// Moves to `Running` for a new input unit. Rejected once draining began.
    pub fn feed(&mut self, stage: &str) -> Result<(), PipelineError> {
        match self {
            CodecState::Open | CodecState::Running => {
                *self = CodecState::Running;
                Ok(())
            }
            CodecState::Draining | CodecState::Closed => Err(PipelineError::InvalidState(
                format!("{}: input fed after end of input ({:?})", stage, self),
            )),
        }
    }

    /// Moves to `Draining`. Returns true only for the call that made the
    /// transition, i.e. when end-of-input still has to be sent to the codec.
    pub fn begin_drain(&mut self) -> bool {
        match self {
            CodecState::Open | CodecState::Running => {
                *self = CodecState::Draining;
                true
            }
            CodecState::Draining | CodecState::Closed => false,
        }
    }

    pub fn close(&mut self) {
        *self = CodecState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        *self == CodecState::Closed
    }
}
