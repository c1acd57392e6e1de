//! Still image output for the video -> images direction.

use std::path::{Path, PathBuf};

use ffmpeg_next::format::Pixel;
use jpeg_encoder::{ColorType, Encoder as JpegEncoder};

use crate::{error::PipelineError, frame::RawVideoFrame};

pub const DEFAULT_QUALITY: u8 = 80;

/// Receives converted frames together with their sequence number.
pub trait ImageWriter {
    /// Pixel format frames must be converted to before [`ImageWriter::write`].
    fn pixel_format(&self) -> Pixel;

    /// Writes `frame` as image number `sequence`, returning where it went.
    fn write(&mut self, sequence: usize, frame: &RawVideoFrame) -> anyhow::Result<PathBuf>;
}

/// Writes `<dir>/<sequence>.jpg` files from RGBA frames.
pub struct JpegWriter {
    dir: PathBuf,
    quality: u8,
}

impl JpegWriter {
    /// Creates `dir` if needed.
    pub fn new(dir: impl AsRef<Path>, quality: u8) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| PipelineError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            quality: quality.clamp(1, 100),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn path_for(&self, sequence: usize) -> PathBuf {
        self.dir.join(format!("{}.jpg", sequence))
    }
}

impl ImageWriter for JpegWriter {
    fn pixel_format(&self) -> Pixel {
        Pixel::RGBA
    }

    fn write(&mut self, sequence: usize, frame: &RawVideoFrame) -> anyhow::Result<PathBuf> {
        let path = self.path_for(sequence);
        let image_error = |reason: String| PipelineError::ImageWrite {
            path: path.clone(),
            reason,
        };

        if frame.format() != Pixel::RGBA {
            return Err(image_error(format!("expected RGBA frame, got {:?}", frame.format())).into());
        }
        let (width, height) = match (u16::try_from(frame.width()), u16::try_from(frame.height())) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(image_error(format!(
                    "unsupported JPEG size {}x{}",
                    frame.width(),
                    frame.height()
                ))
                .into());
            }
        };

        let data = frame.packed_data()?;
        log::info!("Saving file {}", path.display());
        let encoder =
            JpegEncoder::new_file(&path, self.quality).map_err(|e| image_error(e.to_string()))?;
        encoder
            .encode(&data, width, height, ColorType::Rgba)
            .map_err(|e| image_error(e.to_string()))?;
        Ok(path)
    }
}
