use ffmpeg_next::format::Pixel;

use crate::error::PipelineError;

/// A decoded picture: geometry, pixel format and a pts in the time base of the
/// stream that produced it.
///
/// Not `Clone`: a frame has exactly one owner at a time and is released when
/// that owner drops it.
pub struct RawVideoFrame {
    frame: ffmpeg_next::frame::Video,
}

impl From<ffmpeg_next::frame::Video> for RawVideoFrame {
    fn from(frame: ffmpeg_next::frame::Video) -> Self {
        Self { frame }
    }
}

impl RawVideoFrame {
    /// Allocates a frame with buffers for `format` at `width`x`height`.
    pub fn new(format: Pixel, width: u32, height: u32) -> Self {
        Self {
            frame: ffmpeg_next::frame::Video::new(format, width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    pub fn pts(&self) -> Option<i64> {
        self.frame.pts()
    }

    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.frame.set_pts(pts);
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::frame::Video {
        &mut self.frame
    }

    pub fn as_video(&self) -> &ffmpeg_next::frame::Video {
        &self.frame
    }

    /// Size in bytes of the picture with rows packed tightly (alignment 1).
    pub fn packed_len(&self) -> anyhow::Result<usize> {
        packed_len(self.format(), self.width(), self.height())
    }

    /// Copies every plane into one contiguous buffer without row padding.
    ///
    /// For packed formats the result is `width * height * bytes_per_pixel`
    /// long, e.g. RGBA rows of exactly `4 * width` bytes.
    pub fn packed_data(&self) -> anyhow::Result<Vec<u8>> {
        let len = self.packed_len()?;
        let mut buf = vec![0u8; len];
        let written = unsafe {
            let ptr = self.frame.as_ptr();
            ffmpeg_next::ffi::av_image_copy_to_buffer(
                buf.as_mut_ptr(),
                len as i32,
                (*ptr).data.as_ptr() as *const *const u8,
                (*ptr).linesize.as_ptr(),
                self.format().into(),
                self.width() as i32,
                self.height() as i32,
                1,
            )
        };
        if written < 0 {
            return Err(PipelineError::Conversion(format!(
                "cannot pack {:?} {}x{} frame: {}",
                self.format(),
                self.width(),
                self.height(),
                ffmpeg_next::Error::from(written)
            ))
            .into());
        }
        buf.truncate(written as usize);
        Ok(buf)
    }
}

/// Bytes needed for a `format` picture of the given size with packed rows.
pub fn packed_len(format: Pixel, width: u32, height: u32) -> anyhow::Result<usize> {
    let size = unsafe {
        ffmpeg_next::ffi::av_image_get_buffer_size(format.into(), width as i32, height as i32, 1)
    };
    if size < 0 {
        return Err(PipelineError::Conversion(format!(
            "unsupported picture {:?} {}x{}",
            format, width, height
        ))
        .into());
    }
    Ok(size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_len_matches_bytes_per_pixel() {
        assert_eq!(packed_len(Pixel::RGBA, 33, 7).unwrap(), 33 * 7 * 4);
        assert_eq!(packed_len(Pixel::RGB24, 33, 7).unwrap(), 33 * 7 * 3);
        // 4:2:0 carries two quarter-size chroma planes
        assert_eq!(packed_len(Pixel::YUV420P, 64, 32).unwrap(), 64 * 32 * 3 / 2);
    }

    #[test]
    fn test_packed_len_rejects_none_format() {
        assert!(packed_len(Pixel::None, 16, 16).is_err());
    }

    #[test]
    fn test_packed_data_strips_row_padding() {
        // odd width forces linesize > 3 * width
        let mut frame = RawVideoFrame::new(Pixel::RGB24, 5, 3);
        let stride = frame.as_video().stride(0);
        assert!(stride >= 15);
        {
            let video = frame.get_mut();
            let data = video.data_mut(0);
            for row in 0..3 {
                for col in 0..15 {
                    data[row * stride + col] = (row * 15 + col) as u8;
                }
            }
        }

        let packed = frame.packed_data().unwrap();
        assert_eq!(packed.len(), 5 * 3 * 3);
        let expected: Vec<u8> = (0..45).map(|v| v as u8).collect();
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_pts_round_trips() {
        let mut frame = RawVideoFrame::new(Pixel::YUV420P, 16, 16);
        assert_eq!(frame.pts(), None);
        frame.set_pts(Some(42));
        assert_eq!(frame.pts(), Some(42));
        assert_eq!(frame.width(), 16);
        assert_eq!(frame.format(), Pixel::YUV420P);
    }
}
