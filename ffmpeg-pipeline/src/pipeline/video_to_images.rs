use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::{
    binding::InputBinding,
    codec::CodecState,
    decoder::Decoded,
    frame::RawVideoFrame,
    image_writer::{DEFAULT_QUALITY, ImageWriter, JpegWriter},
    input::AvInput,
    scaler::{LazyScaler, ScalerConfig},
};

use super::{report::RunReport, state::WriterState};

#[derive(Debug, Clone)]
pub struct VideoToImagesConfig {
    pub out_dir: PathBuf,
    pub quality: u8,
}

impl Default for VideoToImagesConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("tmp"),
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Decodes the best video stream of a file and hands every frame, converted
/// to the writer's pixel format at source size, to an [`ImageWriter`].
pub struct VideoToImages<W: ImageWriter> {
    writer: W,
    scaler: LazyScaler,
    sequence: WriterState,
}

impl VideoToImages<JpegWriter> {
    /// JPEG output into `config.out_dir`, created if missing.
    pub fn jpeg(config: &VideoToImagesConfig) -> anyhow::Result<Self> {
        Ok(Self::new(JpegWriter::new(&config.out_dir, config.quality)?))
    }
}

impl<W: ImageWriter> VideoToImages<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scaler: LazyScaler::new(),
            sequence: WriterState::new(),
        }
    }

    /// A file without a video stream is not an error: nothing is written and
    /// the returned report is empty.
    pub fn run(
        &mut self,
        src: &Path,
        destination: impl std::fmt::Display,
    ) -> anyhow::Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new("video-to-images", src.display(), destination);
        let mut input = AvInput::open(src)?;
        report.inputs = 1;

        let Some(mut binding) = InputBinding::best_video(&input)? else {
            log::info!("No video stream found in {}", src.display());
            report.finish(started);
            return Ok(report);
        };
        log::info!(
            "decoding stream {} of {} ({}x{} {:?})",
            binding.index(),
            src.display(),
            binding.width(),
            binding.height(),
            binding.format()
        );

        let mut phase = CodecState::Running;
        while !phase.is_closed() {
            let decoded = if phase == CodecState::Running {
                match input.read_packet() {
                    Ok(Some(packet)) if packet.index() != binding.index() => continue,
                    Ok(Some(packet)) => binding.decoder_mut().decode(Some(packet))?,
                    Ok(None) => {
                        phase.begin_drain();
                        binding.decoder_mut().decode(None)?
                    }
                    Err(e) => {
                        log::warn!("read error, flushing decoder: {:#}", e);
                        phase.begin_drain();
                        binding.decoder_mut().decode(None)?
                    }
                }
            } else {
                binding.decoder_mut().decode(None)?
            };

            match decoded {
                Decoded::Frames(frames) => {
                    for frame in frames {
                        report.frames_decoded += 1;
                        self.write_frame(frame)?;
                        report.images_written += 1;
                    }
                }
                Decoded::NeedMoreInput => {}
                Decoded::EndOfStream => phase.close(),
            }
        }

        report.finish(started);
        log::info!("{}", report);
        Ok(report)
    }

    fn write_frame(&mut self, frame: RawVideoFrame) -> anyhow::Result<()> {
        let format = self.writer.pixel_format();
        let converted = self
            .scaler
            .get_or_init(|| ScalerConfig::to_format(&frame, format))?
            .convert(&frame)?;
        drop(frame);
        let sequence = self.sequence.next_sequence();
        self.writer.write(sequence, &converted)?;
        Ok(())
    }
}
