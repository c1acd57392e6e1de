//! End-to-end pipelines.
//!
//! Data flow, one direction per run:
//! ```text
//! images -> video:  AvInput ─► Decoder ─► Scaler ─► Encoder ─► rescale ts ─► AvOutput
//! video -> images:  AvInput ─► Decoder ─► Scaler ─► ImageWriter
//! ```
//!
//! Everything runs on the calling thread. "Need more input" is a return
//! value, not a suspension point.

pub mod encode;
pub mod images_to_video;
pub mod report;
pub mod state;
pub mod video_to_images;

pub use encode::{FrameEncoder, drain, encode_frame};
pub use images_to_video::{ImagesToVideo, ImagesToVideoConfig};
pub use report::RunReport;
pub use state::{PipelineState, WriterState};
pub use video_to_images::{VideoToImages, VideoToImagesConfig};
