use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;

use crate::error::PipelineError;
use crate::frame::RawVideoFrame;

/// Source and destination geometry of a conversion context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalerConfig {
    pub src_width: u32,
    pub src_height: u32,
    pub src_format: Pixel,
    pub dst_width: u32,
    pub dst_height: u32,
    pub dst_format: Pixel,
}

impl ScalerConfig {
    /// Same size, different pixel format.
    pub fn to_format(frame: &RawVideoFrame, dst_format: Pixel) -> Self {
        Self::to_geometry(frame, frame.width(), frame.height(), dst_format)
    }

    pub fn to_geometry(
        frame: &RawVideoFrame,
        dst_width: u32,
        dst_height: u32,
        dst_format: Pixel,
    ) -> Self {
        Self {
            src_width: frame.width(),
            src_height: frame.height(),
            src_format: frame.format(),
            dst_width,
            dst_height,
            dst_format,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.src_width == 0 || self.src_height == 0 {
            return Err(PipelineError::Conversion(format!(
                "invalid source size {}x{}",
                self.src_width, self.src_height
            )));
        }
        if self.dst_width == 0 || self.dst_height == 0 {
            return Err(PipelineError::Conversion(format!(
                "invalid destination size {}x{}",
                self.dst_width, self.dst_height
            )));
        }
        if self.src_format == Pixel::None || self.dst_format == Pixel::None {
            return Err(PipelineError::Conversion(format!(
                "unsupported pixel format {:?} -> {:?}",
                self.src_format, self.dst_format
            )));
        }
        Ok(())
    }

    fn matches(&self, frame: &RawVideoFrame) -> bool {
        frame.width() == self.src_width
            && frame.height() == self.src_height
            && frame.format() == self.src_format
    }
}

/// Pixel format and resolution converter. Always bicubic.
pub struct Scaler {
    config: ScalerConfig,
    context: scaling::Context,
}

impl Scaler {
    pub fn new(config: ScalerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let context = scaling::Context::get(
            config.src_format,
            config.src_width,
            config.src_height,
            config.dst_format,
            config.dst_width,
            config.dst_height,
            scaling::Flags::BICUBIC,
        )
        .map_err(|e| {
            PipelineError::Conversion(format!(
                "{:?} {}x{} -> {:?} {}x{}: {}",
                config.src_format,
                config.src_width,
                config.src_height,
                config.dst_format,
                config.dst_width,
                config.dst_height,
                e
            ))
        })?;
        log::debug!("scaler created: {:?}", config);
        Ok(Self { config, context })
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /// Converts `frame` into a newly allocated frame with the destination
    /// geometry. The source frame is left untouched; its pts is carried over.
    pub fn convert(&mut self, frame: &RawVideoFrame) -> anyhow::Result<RawVideoFrame> {
        if !self.config.matches(frame) {
            return Err(PipelineError::Conversion(format!(
                "frame {:?} {}x{} does not match scaler source {:?} {}x{}",
                frame.format(),
                frame.width(),
                frame.height(),
                self.config.src_format,
                self.config.src_width,
                self.config.src_height
            ))
            .into());
        }

        let mut converted = RawVideoFrame::new(
            self.config.dst_format,
            self.config.dst_width,
            self.config.dst_height,
        );
        self.context
            .run(frame.as_video(), converted.get_mut())
            .map_err(|e| PipelineError::Conversion(e.to_string()))?;
        converted.set_pts(frame.pts());
        Ok(converted)
    }
}

/// A scaler that is built from the first frame it sees and reused for every
/// later frame. Building happens at most once per run.
#[derive(Default)]
pub struct LazyScaler {
    inner: Option<Scaler>,
}

impl LazyScaler {
    pub fn new() -> Self {
        Self { inner: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the scaler, building it from `config` on first use.
    pub fn get_or_init(
        &mut self,
        config: impl FnOnce() -> ScalerConfig,
    ) -> anyhow::Result<&mut Scaler> {
        let scaler = match self.inner.take() {
            Some(scaler) => scaler,
            None => Scaler::new(config())?,
        };
        Ok(self.inner.insert(scaler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(format: Pixel, width: u32, height: u32) -> RawVideoFrame {
        let mut f = RawVideoFrame::new(format, width, height);
        f.set_pts(Some(7));
        f
    }

    #[test]
    fn test_convert_preserves_destination_geometry() {
        let src = frame(Pixel::YUV420P, 64, 48);
        let mut scaler = Scaler::new(ScalerConfig::to_geometry(&src, 30, 20, Pixel::RGBA)).unwrap();
        let out = scaler.convert(&src).unwrap();

        assert_eq!(out.width(), 30);
        assert_eq!(out.height(), 20);
        assert_eq!(out.format(), Pixel::RGBA);
        assert_eq!(out.pts(), Some(7));
        assert_eq!(out.packed_data().unwrap().len(), 30 * 20 * 4);

        // the source frame is untouched
        assert_eq!(src.width(), 64);
        assert_eq!(src.format(), Pixel::YUV420P);
    }

    #[test]
    fn test_dimension_preservation_for_any_source_size() {
        for (w, h) in [(16, 16), (17, 9), (320, 240)] {
            let src = frame(Pixel::YUV420P, w, h);
            let mut scaler =
                Scaler::new(ScalerConfig::to_geometry(&src, 40, 30, Pixel::RGB24)).unwrap();
            let out = scaler.convert(&src).unwrap();
            assert_eq!(out.packed_data().unwrap().len(), 40 * 30 * 3);
        }
    }

    #[test]
    fn test_zero_size_is_conversion_error() {
        let src = frame(Pixel::YUV420P, 16, 16);
        let err = Scaler::new(ScalerConfig::to_geometry(&src, 0, 16, Pixel::RGBA))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Conversion(_))
        ));
    }

    #[test]
    fn test_none_format_is_conversion_error() {
        let src = frame(Pixel::YUV420P, 16, 16);
        assert!(Scaler::new(ScalerConfig::to_format(&src, Pixel::None)).is_err());
    }

    #[test]
    fn test_mismatched_frame_is_rejected() {
        let first = frame(Pixel::YUV420P, 32, 32);
        let mut scaler = Scaler::new(ScalerConfig::to_format(&first, Pixel::RGBA)).unwrap();
        let other = frame(Pixel::YUV420P, 64, 32);
        let err = scaler.convert(&other).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Conversion(_))
        ));
    }

    #[test]
    fn test_lazy_scaler_builds_once() {
        let mut lazy = LazyScaler::new();
        assert!(!lazy.is_initialized());

        let first = frame(Pixel::YUV420P, 32, 32);
        let mut builds = 0;
        for _ in 0..3 {
            let scaler = lazy
                .get_or_init(|| {
                    builds += 1;
                    ScalerConfig::to_format(&first, Pixel::RGBA)
                })
                .unwrap();
            scaler.convert(&first).unwrap();
        }
        assert_eq!(builds, 1);
        assert!(lazy.is_initialized());
    }

    #[test]
    fn test_lazy_scaler_failed_build_is_retried() {
        let mut lazy = LazyScaler::new();
        let first = frame(Pixel::YUV420P, 32, 32);

        let err = lazy
            .get_or_init(|| ScalerConfig::to_geometry(&first, 0, 0, Pixel::RGBA))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Conversion(_))
        ));
        assert!(!lazy.is_initialized());

        let scaler = lazy
            .get_or_init(|| ScalerConfig::to_format(&first, Pixel::RGBA))
            .unwrap();
        assert_eq!(scaler.config().dst_format, Pixel::RGBA);
        assert!(lazy.is_initialized());
    }
}
