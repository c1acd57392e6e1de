//! Fatal error taxonomy for the pipeline.
//!
//! "Need more input" and end-of-stream are not errors; they are carried by
//! [`crate::decoder::Decoded`] and [`crate::encoder::Encoded`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A codec, stream or conversion context could not be created or opened.
    #[error("{stage}: allocation failed: {reason}")]
    Allocation { stage: &'static str, reason: String },

    /// Unexpected codec failure (anything other than EAGAIN / EOF).
    #[error("{stage}: codec error: {source}")]
    Codec {
        stage: &'static str,
        #[source]
        source: ffmpeg_next::Error,
    },

    /// Container level failure: open, header, packet write or trailer.
    #[error("{stage}: container error: {source}")]
    Container {
        stage: &'static str,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("conversion error: {0}")]
    Conversion(String),

    /// A codec driver was fed input in a state that no longer accepts it.
    #[error("invalid codec state: {0}")]
    InvalidState(String),

    #[error("no eligible source files{}", describe_dir(.0))]
    NoSources(PathBuf),

    #[error("no video stream in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing image {}: {reason}", path.display())]
    ImageWrite { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn codec(stage: &'static str, source: ffmpeg_next::Error) -> Self {
        Self::Codec { stage, source }
    }

    pub fn container(stage: &'static str, source: ffmpeg_next::Error) -> Self {
        Self::Container { stage, source }
    }

    pub fn allocation(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::Allocation {
            stage,
            reason: reason.into(),
        }
    }
}

fn describe_dir(dir: &std::path::Path) -> String {
    if dir.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" in {}", dir.display())
    }
}

/// True for the codec's "output not available, send more input" condition.
pub(crate) fn is_again(err: &ffmpeg_next::Error) -> bool {
    matches!(err, ffmpeg_next::Error::Other { errno } if *errno == ffmpeg_next::util::error::EAGAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eagain_is_not_eof() {
        let again = ffmpeg_next::Error::Other {
            errno: ffmpeg_next::util::error::EAGAIN,
        };
        assert!(is_again(&again));
        assert!(!is_again(&ffmpeg_next::Error::Eof));
    }

    #[test]
    fn test_display_carries_stage() {
        let err = PipelineError::codec("encode", ffmpeg_next::Error::InvalidData);
        assert!(err.to_string().starts_with("encode: codec error"));

        let err = PipelineError::NoSources(PathBuf::from("frames"));
        assert_eq!(err.to_string(), "no eligible source files in frames");
        let err = PipelineError::NoSources(PathBuf::new());
        assert_eq!(err.to_string(), "no eligible source files");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = PipelineError::Conversion("bad size".into()).into();
        let err = err.context("rescale frame");
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Conversion(_))
        ));
    }
}
