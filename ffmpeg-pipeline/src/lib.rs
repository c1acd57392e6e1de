/// Registers FFmpeg components (formats, codecs). Call once at startup before
/// opening any input or output.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

/// Sets FFmpeg's own log verbosity (independent of the `log` facade).
pub fn set_ffmpeg_log_level(level: ffmpeg_next::util::log::Level) {
    ffmpeg_next::util::log::set_level(level);
}

pub mod binding;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod image_writer;
pub mod input;
pub mod metadata;
pub mod output;
pub mod packet;
pub mod pipeline;
pub mod scaler;
pub mod source;
pub mod stream;
pub mod timebase;

pub use error::PipelineError;
pub use metadata::probe;
pub use pipeline::{
    ImagesToVideo, ImagesToVideoConfig, RunReport, VideoToImages, VideoToImagesConfig,
};
